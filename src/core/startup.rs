use std::sync::Arc;
use tracing::info;

use crate::core::config::{Config, DatabaseConfig};
use crate::core::error::StartupError;
use crate::core::state::AppState;
use crate::stores::{memory_store::MemoryUserStore, sql_store::SqlUserStore, UserStore};
use crate::users::hasher::PasswordHasher;
use crate::users::manager::UserManager;
use crate::utils::time::{Clock, SystemClock};

/// Open the configured backing store.
///
/// `memory:` selects the volatile in-process store, anything else is handed
/// to sqlx.
pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn UserStore>, StartupError> {
    if config.url.starts_with("memory:") {
        info!("Using volatile in-memory user store");
        return Ok(Arc::new(MemoryUserStore::new()));
    }

    let store = SqlUserStore::connect(&config.url, &config.table, config.max_connections)
        .await
        .map_err(|e| StartupError::InvalidDatabase(e.to_string()))?;

    Ok(Arc::new(store))
}

/// Build the application state: store, user cache and shared services
pub async fn build_state(config: Config) -> Result<AppState, StartupError> {
    config.port()?;

    let hasher = PasswordHasher::new(config.hash_algorithm()?);
    let store = open_store(&config.database).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let users = UserManager::start(store, hasher, clock).await?;

    Ok(AppState::new(config, Arc::new(users)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> Config {
        Config::parse(&format!(
            "[server]\nport = 8080\n[database]\nurl = \"{}\"\ntable = \"users\"\n",
            url
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_build_state_with_memory_store() {
        let state = build_state(config("memory:")).await.unwrap();
        assert!(state.users.is_empty());
    }

    #[tokio::test]
    async fn test_build_state_with_sqlite() {
        let url = format!(
            "sqlite:file:startup_{}?mode=memory&cache=shared",
            uuid::Uuid::new_v4().simple()
        );
        let state = build_state(config(&url)).await.unwrap();

        let user = state
            .users
            .create_user("a", "p", crate::models::permission::PermLevel::Root)
            .await
            .unwrap();
        assert!(user.is_some());
    }
}
