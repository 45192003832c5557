use crate::core::error::StoreError;
use crate::models::permission::PermLevel;
use crate::models::user::{AllowedConnection, User, UserChanges};
use crate::stores::UserStore;
use crate::utils::sql::is_valid_table_name;
use async_trait::async_trait;
use sqlx::any::AnyPoolOptions;
use sqlx::{Any, AnyPool, QueryBuilder};
use tracing::{debug, info};

/// Default table holding users
pub const DEFAULT_TABLE: &str = "emerald.users";

type UserRow = (String, String, String, String, Option<String>);

/// Relational store over a sqlx `AnyPool`.
///
/// MySQL is the production target; SQLite urls work as well, which is what
/// the tests use. Every value is a bound parameter, only the validated table
/// name is interpolated.
#[derive(Debug, Clone)]
pub struct SqlUserStore {
    pool: AnyPool,
    table: String,
}

impl SqlUserStore {
    pub async fn connect(url: &str, table: &str, max_connections: u32) -> Result<Self, StoreError> {
        if !is_valid_table_name(table) {
            return Err(StoreError::InvalidTableName(table.to_string()));
        }

        sqlx::any::install_default_drivers();

        // In-memory SQLite dies with its last connection
        let in_memory = url.contains("mode=memory") || url.contains(":memory:");
        let options = if in_memory {
            AnyPoolOptions::new()
                .max_connections(max_connections)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            AnyPoolOptions::new().max_connections(max_connections)
        };

        let pool = options.connect(url).await?;

        info!(table = %table, max_connections, "Connected to user database");

        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    /// Private in-memory SQLite database
    pub async fn sqlite_in_memory(table: &str) -> Result<Self, StoreError> {
        let url = format!(
            "sqlite:file:emerald_{}?mode=memory&cache=shared",
            uuid::Uuid::new_v4().simple()
        );
        Self::connect(&url, table, 1).await
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

fn row_to_user((id, login, password, perm, allowed_on): UserRow) -> Result<User, StoreError> {
    let perm: PermLevel = perm.parse().map_err(|reason| StoreError::InvalidRow {
        id: id.clone(),
        reason,
    })?;

    let allowed_on = match allowed_on.as_deref() {
        None | Some("") => Vec::new(),
        Some(json) => serde_json::from_str::<Vec<AllowedConnection>>(json)?,
    };

    Ok(User {
        id,
        login,
        password,
        perm,
        allowed_on,
    })
}

#[async_trait]
impl UserStore for SqlUserStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ( id VARCHAR(255) NOT NULL PRIMARY KEY, login TEXT NOT NULL, password TEXT NOT NULL, perm TEXT NOT NULL, allowedOn LONGTEXT )",
            self.table
        );
        sqlx::query(&sql).execute(&self.pool).await?;

        debug!(table = %self.table, "User table ready");
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT id, login, password, perm, allowedOn FROM {}", self.table);
        let rows: Vec<UserRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        rows.into_iter().map(row_to_user).collect()
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO {} ( id, login, password, perm, allowedOn ) VALUES ( ?, ?, ?, ?, ? )",
            self.table
        );
        let allowed_on = serde_json::to_string(&user.allowed_on)?;

        sqlx::query(&sql)
            .bind(user.id.clone())
            .bind(user.login.clone())
            .bind(user.password.clone())
            .bind(user.perm.level().to_string())
            .bind(allowed_on)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update(&self, id: &str, changes: &UserChanges) -> Result<(), StoreError> {
        if changes == &UserChanges::default() {
            return Ok(());
        }

        let mut query: QueryBuilder<Any> = QueryBuilder::new(format!("UPDATE {} SET ", self.table));
        let mut separated = query.separated(", ");

        if let Some(login) = &changes.login {
            separated.push("login = ");
            separated.push_bind_unseparated(login.clone());
        }
        if let Some(hash) = &changes.password_hash {
            separated.push("password = ");
            separated.push_bind_unseparated(hash.clone());
        }
        if let Some(perm) = changes.perm {
            separated.push("perm = ");
            separated.push_bind_unseparated(perm.level().to_string());
        }

        query.push(" WHERE id = ");
        query.push_bind(id.to_string());

        query.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", self.table);
        sqlx::query(&sql).bind(id.to_string()).execute(&self.pool).await?;
        Ok(())
    }

    async fn save_allowed_on(&self, id: &str, allowed_on: &[AllowedConnection]) -> Result<(), StoreError> {
        let sql = format!("UPDATE {} SET allowedOn = ? WHERE id = ?", self.table);
        let json = serde_json::to_string(allowed_on)?;

        sqlx::query(&sql)
            .bind(json)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
