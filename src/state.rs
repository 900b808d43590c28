use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::auth::{AuthService, SqlApiKeyStore, SqlUserStore};
use crate::config::AppConfig;
use crate::database::DatabaseManager;

/// Shared application state handed to every handler through axum `State`.
/// Built once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseManager,
    pub auth: AuthService,
}

impl AppState {
    /// Connect, create the schema and seed the configured credentials.
    pub async fn initialize(config: AppConfig) -> anyhow::Result<Self> {
        info!("Connecting to database {}", config.database.url);
        let db = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to database")?;
        db.migrate().await.context("failed to create schema")?;

        let auth = AuthService::new(
            Arc::new(SqlUserStore::new(db.pool().clone())),
            Arc::new(SqlApiKeyStore::new(db.pool().clone())),
            &config.security,
        );
        auth.bootstrap(&config.security)
            .await
            .context("failed to seed credentials")?;

        Ok(Self {
            config: Arc::new(config),
            db,
            auth,
        })
    }
}
