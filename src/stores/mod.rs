pub mod memory_store;
pub mod sql_store;

use crate::core::error::StoreError;
use crate::models::user::{AllowedConnection, User, UserChanges};
use async_trait::async_trait;

/// Persistence side of the user manager.
///
/// The manager mutates its cache first and then calls exactly one of these
/// methods; implementations do not need to know about the cache.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create the backing table if it does not exist yet
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    async fn load_all(&self) -> Result<Vec<User>, StoreError>;

    async fn insert(&self, user: &User) -> Result<(), StoreError>;

    async fn update(&self, id: &str, changes: &UserChanges) -> Result<(), StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Overwrite the stored allowance list of one user
    async fn save_allowed_on(&self, id: &str, allowed_on: &[AllowedConnection]) -> Result<(), StoreError>;
}
