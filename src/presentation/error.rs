// Mapping of use-case errors to JSON HTTP responses
use crate::application::anomaly_service::PipelineError;
use crate::application::auth_service::AuthError;
use crate::application::telemetry_source::FetchError;
use crate::domain::date::DateRangeError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

const UPSTREAM_FAILURE: &str = "Failed to retrieve data from external API";
const INTERNAL_FAILURE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    DateRange(#[from] DateRangeError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Query(#[from] QueryRejection),

    #[error(transparent)]
    Json(#[from] JsonRejection),

    #[error(transparent)]
    Path(#[from] PathRejection),
}

fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::DateRange(e) => error_body(StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Pipeline(e) => pipeline_response(e),
            ApiError::Auth(e) => auth_response(e),
            // Extractor rejections keep axum's status but use the JSON error body
            ApiError::Query(e) => error_body(e.status(), e.body_text()),
            ApiError::Json(e) => error_body(e.status(), e.body_text()),
            ApiError::Path(e) => error_body(e.status(), e.body_text()),
        }
    }
}

fn pipeline_response(e: PipelineError) -> Response {
    match e {
        PipelineError::Fetch(FetchError::Upstream { status }) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": UPSTREAM_FAILURE, "status_code": status })),
        )
            .into_response(),
        PipelineError::Fetch(e) => {
            tracing::error!("Telemetry fetch failed: {}", e);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, UPSTREAM_FAILURE)
        }
        e @ (PipelineError::MissingSignal(_)
        | PipelineError::MalformedSignal { .. }
        | PipelineError::InsufficientReadings { .. }) => {
            error_body(StatusCode::BAD_REQUEST, e.to_string())
        }
        e @ PipelineError::Inference { .. } => {
            tracing::error!("{}", e);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Model inference failed")
        }
        PipelineError::Classify(e) => {
            tracing::error!("Classification failed: {}", e);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_FAILURE)
        }
    }
}

fn auth_response(e: AuthError) -> Response {
    let status = match &e {
        AuthError::MissingFields | AuthError::UsernameTaken => StatusCode::BAD_REQUEST,
        AuthError::InvalidCredentials | AuthError::MissingToken | AuthError::InvalidToken => {
            StatusCode::UNAUTHORIZED
        }
        AuthError::InvalidSubject => StatusCode::UNPROCESSABLE_ENTITY,
        AuthError::UserNotFound => StatusCode::NOT_FOUND,
        AuthError::AdminRequired => StatusCode::FORBIDDEN,
        AuthError::Credentials(_) | AuthError::Storage(_) => {
            tracing::error!("Auth failure: {}", e);
            return error_body(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_FAILURE);
        }
    };
    error_body(status, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::inference::InferenceError;
    use crate::domain::telemetry::SignalKind;

    #[test]
    fn test_statuses() {
        let cases = vec![
            (ApiError::from(DateRangeError::Missing), StatusCode::BAD_REQUEST),
            (
                ApiError::from(PipelineError::MissingSignal(SignalKind::Salinity)),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(PipelineError::Fetch(FetchError::Upstream { status: 503 })),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(PipelineError::Fetch(FetchError::Transport("refused".to_string()))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::from(PipelineError::Inference {
                    kind: SignalKind::Conductivity,
                    source: InferenceError::EmptyBatch,
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::from(AuthError::AdminRequired), StatusCode::FORBIDDEN),
            (ApiError::from(AuthError::InvalidSubject), StatusCode::UNPROCESSABLE_ENTITY),
            (ApiError::from(AuthError::MissingToken), StatusCode::UNAUTHORIZED),
            (
                ApiError::from(AuthError::Storage("down".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
