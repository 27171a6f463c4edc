// In-process user store
use crate::application::user_repository::{UserRepository, UsernameConflict};
use crate::domain::user::{NewUser, User, UserChanges};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Store {
    users: BTreeMap<u64, User>,
    next_id: u64,
}

/// Users live for the lifetime of the process; the admin account is seeded
/// from configuration at startup.
#[derive(Default)]
pub struct InMemoryUserRepository {
    store: RwLock<Store>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn list(&self) -> Result<Vec<User>> {
        Ok(self.store.read().await.users.values().cloned().collect())
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<User>> {
        Ok(self.store.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .store
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut store = self.store.write().await;
        if store.users.values().any(|u| u.username == user.username) {
            return Err(UsernameConflict(user.username).into());
        }

        store.next_id += 1;
        let user = User {
            id: store.next_id,
            username: user.username,
            password_hash: user.password_hash,
            is_admin: user.is_admin,
            created_at: Utc::now(),
        };
        store.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: u64, changes: UserChanges) -> Result<Option<User>> {
        let mut store = self.store.write().await;
        if !store.users.contains_key(&id) {
            return Ok(None);
        }
        if let Some(username) = &changes.username {
            if store.users.values().any(|u| u.id != id && &u.username == username) {
                return Err(UsernameConflict(username.clone()).into());
            }
        }

        Ok(store.users.get_mut(&id).map(|user| {
            user.apply(changes);
            user.clone()
        }))
    }

    async fn delete(&self, id: u64) -> Result<bool> {
        Ok(self.store.write().await.users.remove(&id).is_some())
    }
}
