// Auth service - Login, token checks and admin-only user management
use crate::application::user_repository::{UserRepository, UsernameConflict};
use crate::domain::user::{NewUser, User, UserChanges};
use crate::infrastructure::password::PasswordHasher;
use crate::infrastructure::token::{Claims, TokenIssuer};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;

/// Verified in place of a real hash when the username is unknown, so both
/// login failures cost one Argon2 verification
const DECOY_PASSWORD: &str = "decoy-password";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing Authorization Header")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid token subject")]
    InvalidSubject,

    #[error("User not found")]
    UserNotFound,

    #[error("Admin privileges required")]
    AdminRequired,

    #[error("credential processing failed: {0}")]
    Credentials(String),

    #[error("user store failure: {0}")]
    Storage(String),
}

fn storage(e: anyhow::Error) -> AuthError {
    if e.downcast_ref::<UsernameConflict>().is_some() {
        AuthError::UsernameTaken
    } else {
        AuthError::Storage(e.to_string())
    }
}

fn credentials(e: impl std::fmt::Display) -> AuthError {
    AuthError::Credentials(e.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginGrant {
    pub access_token: String,
    pub is_admin: bool,
}

/// Requested changes to a user; the password is still in clear text here
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub is_admin: Option<bool>,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    decoy_hash: Arc<OnceCell<String>>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, hasher: PasswordHasher, tokens: TokenIssuer) -> Self {
        Self {
            users,
            hasher,
            tokens,
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    // Argon2 is CPU bound; both calls run on the blocking pool

    async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(credentials)?
            .map_err(credentials)
    }

    async fn verify(&self, password: &str, stored_hash: String) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .map_err(credentials)
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<User, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        if self.users.find_by_username(username).await.map_err(storage)?.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let user = self
            .users
            .insert(NewUser {
                username: username.to_string(),
                password_hash: self.hash(password).await?,
                is_admin,
            })
            .await
            .map_err(storage)?;

        tracing::info!(user_id = user.id, username = %user.username, is_admin, "User registered");
        Ok(user)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginGrant, AuthError> {
        let user = self.users.find_by_username(username).await.map_err(storage)?;

        let stored_hash = match &user {
            Some(user) => user.password_hash.clone(),
            None => self
                .decoy_hash
                .get_or_try_init(|| self.hash(DECOY_PASSWORD))
                .await?
                .clone(),
        };
        let verified = self.verify(password, stored_hash).await?;

        let user = user
            .filter(|_| verified)
            .ok_or(AuthError::InvalidCredentials)?;

        let access_token = self
            .tokens
            .issue(&user.id.to_string())
            .map_err(credentials)?;

        Ok(LoginGrant {
            access_token,
            is_admin: user.is_admin,
        })
    }

    /// Signature and expiry only; the subject is not looked up
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.tokens.verify(token).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            AuthError::InvalidToken
        })
    }

    /// Resolve the token's subject to an existing admin user
    pub async fn authorize_admin(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.verify_token(token)?;
        let id: u64 = claims.sub.parse().map_err(|_| AuthError::InvalidSubject)?;

        let user = self
            .users
            .find_by_id(id)
            .await
            .map_err(storage)?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_admin {
            return Err(AuthError::AdminRequired);
        }
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        self.users.list().await.map_err(storage)
    }

    /// Username uniqueness is enforced by the repository under its own lock
    pub async fn update_user(&self, id: u64, update: UserUpdate) -> Result<User, AuthError> {
        let password_hash = match &update.password {
            Some(password) => Some(self.hash(password).await?),
            None => None,
        };

        self.users
            .update(
                id,
                UserChanges {
                    username: update.username,
                    password_hash,
                    is_admin: update.is_admin,
                },
            )
            .await
            .map_err(storage)?
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn delete_user(&self, id: u64) -> Result<(), AuthError> {
        if self.users.delete(id).await.map_err(storage)? {
            tracing::info!(user_id = id, "User deleted");
            Ok(())
        } else {
            Err(AuthError::UserNotFound)
        }
    }

    /// Create the admin account unless the username is already taken.
    /// Returns whether a user was created.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        if self.users.find_by_username(username).await.map_err(storage)?.is_some() {
            tracing::info!(username, "Admin user already exists");
            return Ok(false);
        }
        self.register(username, password, true).await?;
        Ok(true)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::infrastructure::memory_user_repository::InMemoryUserRepository;
    use chrono::Duration;

    pub fn auth_service() -> AuthService {
        AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            PasswordHasher::default(),
            TokenIssuer::new("test-secret", Duration::seconds(3600)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::testing::auth_service;
    use super::*;

    #[tokio::test]
    async fn test_register_and_login() {
        let auth = auth_service();
        let user = auth.register("operator", "pw", false).await.unwrap();
        assert_ne!(user.password_hash, "pw");

        let grant = auth.login("operator", "pw").await.unwrap();
        assert!(!grant.is_admin);
        assert_eq!(auth.verify_token(&grant.access_token).unwrap().sub, user.id.to_string());
    }

    #[tokio::test]
    async fn test_login_failures_look_the_same() {
        let auth = auth_service();
        auth.register("operator", "pw", false).await.unwrap();

        assert!(matches!(auth.login("operator", "nope").await, Err(AuthError::InvalidCredentials)));
        assert!(auth.decoy_hash.get().is_none());

        // Unknown users still pay for a verification
        assert!(matches!(auth.login("ghost", "pw").await, Err(AuthError::InvalidCredentials)));
        assert!(auth.decoy_hash.get().is_some_and(|h| h.starts_with("$argon2")));
        assert!(matches!(
            auth.login("ghost", DECOY_PASSWORD).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_renames_to_one_name() {
        let auth = auth_service();
        let a = auth.register("a", "pw", false).await.unwrap();
        let b = auth.register("b", "pw", false).await.unwrap();

        let rename = || UserUpdate {
            username: Some("shared".to_string()),
            ..Default::default()
        };
        let (first, second) = tokio::join!(auth.update_user(a.id, rename()), auth.update_user(b.id, rename()));

        assert_eq!([first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert!(matches!(
            first.err().or(second.err()),
            Some(AuthError::UsernameTaken)
        ));
        let names: Vec<String> = auth.list_users().await.unwrap().into_iter().map(|u| u.username).collect();
        assert_eq!(names.iter().filter(|n| *n == "shared").count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_and_incomplete_registration() {
        let auth = auth_service();
        auth.register("operator", "pw", false).await.unwrap();

        assert!(matches!(auth.register("operator", "other", false).await, Err(AuthError::UsernameTaken)));
        assert!(matches!(auth.register("", "pw", false).await, Err(AuthError::MissingFields)));
    }

    #[tokio::test]
    async fn test_authorize_admin() {
        let auth = auth_service();
        auth.ensure_admin("admin", "admin-pw").await.unwrap();
        auth.register("operator", "pw", false).await.unwrap();

        let admin = auth.login("admin", "admin-pw").await.unwrap();
        assert!(admin.is_admin);
        assert_eq!(auth.authorize_admin(&admin.access_token).await.unwrap().username, "admin");

        let operator = auth.login("operator", "pw").await.unwrap();
        assert!(matches!(
            auth.authorize_admin(&operator.access_token).await,
            Err(AuthError::AdminRequired)
        ));
        assert!(matches!(auth.authorize_admin("garbage").await, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_deleted_admin_token_no_longer_authorizes() {
        let auth = auth_service();
        auth.ensure_admin("admin", "pw").await.unwrap();
        let grant = auth.login("admin", "pw").await.unwrap();

        let id = auth.list_users().await.unwrap()[0].id;
        auth.delete_user(id).await.unwrap();

        assert!(matches!(auth.authorize_admin(&grant.access_token).await, Err(AuthError::UserNotFound)));
        assert!(matches!(auth.delete_user(id).await, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let auth = auth_service();
        assert!(auth.ensure_admin("admin", "pw").await.unwrap());
        assert!(!auth.ensure_admin("admin", "pw").await.unwrap());
        assert_eq!(auth.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_user_password_and_name() {
        let auth = auth_service();
        let user = auth.register("operator", "pw", false).await.unwrap();
        auth.register("other", "pw", false).await.unwrap();

        let updated = auth
            .update_user(
                user.id,
                UserUpdate {
                    password: Some("new-pw".to_string()),
                    is_admin: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.is_admin);
        assert!(auth.login("operator", "new-pw").await.is_ok());
        assert!(auth.login("operator", "pw").await.is_err());

        let clash = UserUpdate {
            username: Some("other".to_string()),
            ..Default::default()
        };
        assert!(matches!(auth.update_user(user.id, clash).await, Err(AuthError::UsernameTaken)));
        assert!(matches!(
            auth.update_user(404, UserUpdate::default()).await,
            Err(AuthError::UserNotFound)
        ));
    }
}
