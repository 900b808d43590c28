use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::schema;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// A rule that needs stored state to check, e.g. a group's start date.
    #[error(transparent)]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Maps a unique-constraint violation to `Conflict`, leaving every other
    /// error untouched.
    pub fn unique(err: sqlx::Error, message: impl Into<String>) -> Self {
        let is_unique = err
            .as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false);
        if is_unique {
            DatabaseError::Conflict(message.into())
        } else {
            DatabaseError::Sqlx(err)
        }
    }
}

/// Owns the connection pool. Constructed once at startup and cloned into the
/// application state.
#[derive(Clone, Debug)]
pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    /// Open the pool described by `config`. In-memory databases are pinned to
    /// a single long-lived connection, otherwise every pooled connection
    /// would see its own empty database.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|_| DatabaseError::InvalidDatabaseUrl(config.url.clone()))?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = Self::is_memory_url(&config.url);
        let mut pool_options = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(config.connection_timeout));
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(config.max_connections)
        };

        let pool = pool_options.connect_with(options).await?;
        info!("Opened database pool for: {}", config.url);
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create every table that does not exist yet.
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        for statement in schema::STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema is up to date ({} statements)", schema::STATEMENTS.len());
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    fn is_memory_url(url: &str) -> bool {
        url.contains(":memory:") || url.contains("mode=memory")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> DatabaseConfig {
        DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 5,
            connection_timeout: 5,
        }
    }

    #[test]
    fn detects_memory_urls() {
        assert!(DatabaseManager::is_memory_url("sqlite::memory:"));
        assert!(DatabaseManager::is_memory_url("sqlite://file.db?mode=memory"));
        assert!(!DatabaseManager::is_memory_url("sqlite://students_new.db"));
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let db = DatabaseManager::connect(&memory_config()).await.unwrap();
        db.migrate().await.unwrap();
        db.migrate().await.unwrap();
        db.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let db = DatabaseManager::connect(&memory_config()).await.unwrap();
        db.migrate().await.unwrap();
        let result = sqlx::query(
            "INSERT INTO students (first_name, last_name, group_id) VALUES ('Ivan', 'Ivanov', 42)",
        )
        .execute(db.pool())
        .await;
        assert!(result.is_err());
    }
}
