use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::api_key::ApiKeyRecord;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::store::{ApiKeyStore, UserStore};
use crate::auth::{JwtError, TokenService};
use crate::config::SecurityConfig;
use crate::database::models::user::NewUser;
use crate::database::DatabaseError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Store(#[from] DatabaseError),

    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error("{0}")]
    Hash(String),

    #[error("unknown user '{0}'")]
    UnknownUser(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    Token,
    ApiKey,
}

/// Identity resolved for a protected request.
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub username: String,
    pub is_admin: bool,
    pub method: AuthMethod,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// Both credential mechanisms over injected stores. Built once at startup.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    api_keys: Arc<dyn ApiKeyStore>,
    tokens: TokenService,
    hash_rounds: u32,
    allow_admin_registration: bool,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        api_keys: Arc<dyn ApiKeyStore>,
        security: &SecurityConfig,
    ) -> Self {
        Self {
            users,
            api_keys,
            tokens: TokenService::from_config(security),
            hash_rounds: security.password_hash_rounds,
            allow_admin_registration: security.allow_admin_registration,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn allows_admin_registration(&self) -> bool {
        self.allow_admin_registration
    }

    /// Seed the configured admin account and API keys. Existing users are
    /// left untouched; API keys are upserted.
    pub async fn bootstrap(&self, security: &SecurityConfig) -> Result<(), AuthError> {
        if !security.admin_username.is_empty() && !security.admin_password.is_empty() {
            let created = self
                .register_user(&security.admin_username, &security.admin_password, true)
                .await?;
            if created {
                info!("Seeded admin user '{}'", security.admin_username);
            }
        }

        for record in &security.api_keys {
            self.api_keys.upsert(record).await?;
        }
        if !security.api_keys.is_empty() {
            info!("Seeded {} API key(s)", security.api_keys.len());
        }

        Ok(())
    }

    // --- API-key variant -------------------------------------------------

    /// Whether `api_key` is registered at all. Used by `check-api-key`.
    pub async fn is_valid_api_key(&self, api_key: &str) -> Result<bool, AuthError> {
        Ok(self.api_keys.find_by_key(api_key).await?.is_some())
    }

    /// `false` for unknown keys as well as for `user` keys.
    pub async fn is_admin(&self, api_key: &str) -> Result<bool, AuthError> {
        Ok(self
            .api_keys
            .find_by_key(api_key)
            .await?
            .map(|record| record.is_admin())
            .unwrap_or(false))
    }

    pub async fn identify_api_key(&self, api_key: &str) -> Result<Option<AuthUser>, AuthError> {
        Ok(self
            .api_keys
            .find_by_key(api_key)
            .await?
            .map(|record: ApiKeyRecord| AuthUser {
                is_admin: record.is_admin(),
                username: record.username,
                method: AuthMethod::ApiKey,
            }))
    }

    // --- Token variant ---------------------------------------------------

    pub async fn generate_token(&self, username: &str) -> Result<IssuedToken, AuthError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AuthError::UnknownUser(username.to_string()))?;

        let access_token = self.tokens.issue(&user.username, user.is_admin)?;
        Ok(IssuedToken {
            access_token,
            token_type: "bearer",
            expires_in: self.tokens.expires_in(),
        })
    }

    /// `None` on any failure: bad signature, expiry, missing claims, or a
    /// subject that no longer exists.
    pub async fn verify_token(&self, token: &str) -> Option<AuthUser> {
        let claims = self.tokens.decode(token)?;

        match self.users.find_by_username(&claims.sub).await {
            Ok(Some(_)) => Some(AuthUser {
                username: claims.sub,
                is_admin: claims.is_admin,
                method: AuthMethod::Token,
            }),
            Ok(None) => {
                warn!("Token subject '{}' no longer exists", claims.sub);
                None
            }
            Err(e) => {
                warn!("User lookup failed during token verification: {}", e);
                None
            }
        }
    }

    pub async fn authenticate_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, AuthError> {
        let Some(user) = self.users.find_by_username(username).await? else {
            return Ok(false);
        };
        let stored = user.password_hash;
        let password = password.to_string();

        // Hashing runs on the blocking pool.
        tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| AuthError::Hash(e.to_string()))
    }

    /// Returns `false` when the username is already registered.
    pub async fn register_user(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<bool, AuthError> {
        if self.users.find_by_username(username).await?.is_some() {
            return Ok(false);
        }

        let rounds = self.hash_rounds;
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, rounds))
            .await
            .map_err(|e| AuthError::Hash(e.to_string()))?
            .map_err(AuthError::Hash)?;

        Ok(self
            .users
            .insert(NewUser {
                username: username.to_string(),
                password_hash,
                is_admin,
            })
            .await?)
    }
}
