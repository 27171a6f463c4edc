// Login and admin-only user management handlers
use crate::application::auth_service::{AuthError, AuthService, UserUpdate};
use crate::domain::user::UserSummary;
use crate::presentation::auth::AdminUser;
use crate::presentation::error::ApiError;
use crate::presentation::extract::{JsonBody, PathParam};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Deserialize)]
pub struct CredentialsBody {
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl CredentialsBody {
    fn required(&self) -> Result<(&str, &str), AuthError> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok((username.as_str(), password.as_str())),
            _ => Err(AuthError::MissingFields),
        }
    }
}

#[derive(Deserialize)]
pub struct UserUpdateBody {
    pub username: Option<String>,
    pub password: Option<String>,
    pub is_admin: Option<bool>,
}

pub async fn register(
    AdminUser(admin): AdminUser,
    State(auth): State<AuthService>,
    JsonBody(body): JsonBody<CredentialsBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (username, password) = body.required()?;
    let user = auth.register(username, password, body.is_admin).await?;

    tracing::info!(created_by = %admin.username, user_id = user.id, "Admin registered user");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully" })),
    ))
}

pub async fn login(
    State(auth): State<AuthService>,
    JsonBody(body): JsonBody<CredentialsBody>,
) -> Result<Json<Value>, ApiError> {
    let (username, password) = body.required()?;
    let grant = auth.login(username, password).await?;

    Ok(Json(json!({
        "access_token": grant.access_token,
        "is_admin": grant.is_admin,
    })))
}

pub async fn list_users(
    _admin: AdminUser,
    State(auth): State<AuthService>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = auth.list_users().await?;
    Ok(Json(users.iter().map(UserSummary::from).collect()))
}

pub async fn update_user(
    _admin: AdminUser,
    State(auth): State<AuthService>,
    PathParam(user_id): PathParam<u64>,
    JsonBody(body): JsonBody<UserUpdateBody>,
) -> Result<Json<Value>, ApiError> {
    auth.update_user(
        user_id,
        UserUpdate {
            username: body.username,
            password: body.password,
            is_admin: body.is_admin,
        },
    )
    .await?;

    Ok(Json(json!({ "message": "User updated successfully" })))
}

pub async fn delete_user(
    _admin: AdminUser,
    State(auth): State<AuthService>,
    PathParam(user_id): PathParam<u64>,
) -> Result<Json<Value>, ApiError> {
    auth.delete_user(user_id).await?;
    Ok(Json(json!({ "message": "User deleted successfully" })))
}
