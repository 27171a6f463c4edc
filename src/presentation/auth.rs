// Bearer token checks for protected routes
use crate::application::auth_service::{AuthError, AuthService};
use crate::domain::user::User;
use crate::presentation::error::ApiError;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidToken)
}

/// Middleware: any valid, unexpired token passes
pub async fn require_token(
    State(auth): State<AuthService>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;
    auth.verify_token(token)?;
    Ok(next.run(request).await)
}

/// Extractor that only succeeds for a token belonging to an existing admin
pub struct AdminUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AuthService> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, auth: &AuthService) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        Ok(AdminUser(auth.authorize_admin(token).await?))
    }
}
