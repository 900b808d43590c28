use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, SqlitePool};

use crate::auth::api_key::{ApiKeyRecord, Role};
use crate::database::models::user::{NewUser, User};
use crate::database::DatabaseError;

/// Lookup-by-username capability used by token auth.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    /// Returns `false` when the username is already taken.
    async fn insert(&self, user: NewUser) -> Result<bool, DatabaseError>;
}

/// Lookup-by-key capability used by API-key auth.
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    async fn find_by_key(&self, api_key: &str) -> Result<Option<ApiKeyRecord>, DatabaseError>;

    /// Insert or replace the record for `record.api_key`.
    async fn upsert(&self, record: &ApiKeyRecord) -> Result<(), DatabaseError>;
}

pub struct SqlUserStore {
    pool: SqlitePool,
}

impl SqlUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for SqlUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, is_admin, created_at
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, is_admin, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) => match DatabaseError::unique(e, "username taken") {
                DatabaseError::Conflict(_) => Ok(false),
                other => Err(other),
            },
        }
    }
}

#[derive(FromRow)]
struct ApiKeyRow {
    api_key: String,
    username: String,
    role: String,
}

pub struct SqlApiKeyStore {
    pool: SqlitePool,
}

impl SqlApiKeyStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyStore for SqlApiKeyStore {
    async fn find_by_key(&self, api_key: &str) -> Result<Option<ApiKeyRecord>, DatabaseError> {
        let row = sqlx::query_as::<_, ApiKeyRow>(
            "SELECT api_key, username, role FROM api_keys WHERE api_key = ?",
        )
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|row| {
            // The CHECK constraint keeps unknown roles out; treat one as no match.
            let role = row.role.parse::<Role>().ok()?;
            Some(ApiKeyRecord::new(row.username, row.api_key, role))
        }))
    }

    async fn upsert(&self, record: &ApiKeyRecord) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO api_keys (api_key, username, role) VALUES (?, ?, ?)
             ON CONFLICT (api_key)
             DO UPDATE SET username = excluded.username, role = excluded.role",
        )
        .bind(&record.api_key)
        .bind(&record.username)
        .bind(record.role.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
