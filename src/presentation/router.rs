// Route table
use crate::application::anomaly_service::AnomalyService;
use crate::application::auth_service::AuthService;
use crate::presentation::app_state::AppState;
use crate::presentation::auth::require_token;
use crate::presentation::auth_handlers::{delete_user, list_users, login, register, update_user};
use crate::presentation::handlers::{
    debug_conductivity, debug_salinity, health_check, predict_anomaly, predict_conductivity,
    predict_salinity,
};
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

/// Prediction routes are gated behind a bearer token only when `auth` is set;
/// the auth and user routes are mounted only in that case as well.
pub fn build_router(anomaly_service: AnomalyService, auth: Option<AuthService>) -> Router {
    let state = Arc::new(AppState { anomaly_service });

    let mut predictions = Router::new()
        .route("/predict_anomaly", get(predict_anomaly))
        .route("/predict_conductivity", get(predict_conductivity))
        .route("/predict_salinity", get(predict_salinity))
        .route("/debug_conductivity", get(debug_conductivity))
        .route("/debug_salinity", get(debug_salinity));

    if let Some(auth) = &auth {
        predictions = predictions.route_layer(middleware::from_fn_with_state(auth.clone(), require_token));
    }

    let router = Router::new()
        .route("/health", get(health_check))
        .merge(predictions)
        .with_state(state);

    match auth {
        Some(auth) => router.merge(auth_routes(auth)),
        None => router,
    }
}

fn auth_routes(auth: AuthService) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/users", get(list_users))
        .route("/users/:user_id", put(update_user).delete(delete_user))
        .with_state(auth)
}
