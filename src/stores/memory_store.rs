use crate::core::error::StoreError;
use crate::models::user::{AllowedConnection, User, UserChanges};
use crate::stores::UserStore;
use async_trait::async_trait;
use dashmap::DashMap;

/// Volatile store keeping rows in memory.
///
/// Selected with a `memory:` database url; everything is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    rows: DashMap<String, User>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }

    /// Seed the store with existing rows
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let store = Self::new();
        for user in users {
            store.rows.insert(user.id.clone(), user);
        }
        store
    }

    /// Get a copy of a stored row
    pub fn get(&self, id: &str) -> Option<User> {
        self.rows.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.rows.iter().map(|entry| entry.value().clone()).collect())
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        self.rows.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update(&self, id: &str, changes: &UserChanges) -> Result<(), StoreError> {
        if let Some(mut row) = self.rows.get_mut(id) {
            if let Some(login) = &changes.login {
                row.login = login.clone();
            }
            if let Some(hash) = &changes.password_hash {
                row.password = hash.clone();
            }
            if let Some(perm) = changes.perm {
                row.perm = perm;
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.rows.remove(id);
        Ok(())
    }

    async fn save_allowed_on(&self, id: &str, allowed_on: &[AllowedConnection]) -> Result<(), StoreError> {
        if let Some(mut row) = self.rows.get_mut(id) {
            row.allowed_on = allowed_on.to_vec();
        }
        Ok(())
    }
}
