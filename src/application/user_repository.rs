// Repository trait for user records
use crate::domain::user::{NewUser, User, UserChanges};
use async_trait::async_trait;
use thiserror::Error;

/// Returned (inside `anyhow::Error`) when a write would duplicate a username
#[derive(Debug, Error)]
#[error("username {0} already stored")]
pub struct UsernameConflict(pub String);

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<User>>;

    async fn find_by_id(&self, id: u64) -> anyhow::Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;

    /// Store a new user, assigning its id and creation time. Fails with
    /// `UsernameConflict` if the name is taken.
    async fn insert(&self, user: NewUser) -> anyhow::Result<User>;

    /// Apply changes to an existing user. `Ok(None)` when the id is unknown;
    /// renaming onto another user's name fails with `UsernameConflict`.
    async fn update(&self, id: u64, changes: UserChanges) -> anyhow::Result<Option<User>>;

    /// Returns whether a user was removed
    async fn delete(&self, id: u64) -> anyhow::Result<bool>;
}
