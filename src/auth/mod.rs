pub mod api_key;
pub mod password;
pub mod service;
pub mod store;

pub use api_key::{ApiKeyRecord, Role};
pub use service::{AuthError, AuthMethod, AuthService, AuthUser, IssuedToken};
pub use store::{ApiKeyStore, SqlApiKeyStore, SqlUserStore, UserStore};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{SecurityConfig, MAX_TOKEN_TTL_SECS};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

impl Claims {
    pub fn new(
        sub: String,
        is_admin: bool,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, JwtError> {
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| JwtError::TokenGeneration("token expiry is out of range".to_string()))?;

        Ok(Self {
            sub,
            is_admin,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        })
    }
}

#[derive(Debug)]
pub enum JwtError {
    TokenGeneration(String),
    InvalidSecret,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenGeneration(msg) => write!(f, "JWT generation error: {}", msg),
            JwtError::InvalidSecret => write!(f, "Invalid JWT secret"),
        }
    }
}

impl std::error::Error for JwtError {}

/// HS256 token issuance and verification with a fixed lifetime.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenService {
    /// Lifetimes above [`MAX_TOKEN_TTL_SECS`] are capped to it.
    pub fn new(secret: impl Into<String>, ttl_secs: u64) -> Self {
        let capped = ttl_secs.min(MAX_TOKEN_TTL_SECS);
        if capped != ttl_secs {
            tracing::warn!("JWT lifetime {}s is too long, using {}s", ttl_secs, capped);
        }
        let ttl = i64::try_from(capped)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or_else(|| Duration::days(365));

        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(security.jwt_secret.clone(), security.jwt_expiration_secs)
    }

    /// Token lifetime in seconds, as reported to clients.
    pub fn expires_in(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn issue(&self, sub: &str, is_admin: bool) -> Result<String, JwtError> {
        self.issue_at(sub, is_admin, Utc::now())
    }

    pub fn issue_at(
        &self,
        sub: &str,
        is_admin: bool,
        issued_at: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        if self.secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }

        let claims = Claims::new(sub.to_string(), is_admin, issued_at, self.ttl)?;
        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());

        encode(&Header::new(Algorithm::HS256), &claims, &encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    /// Decode and check signature, expiry (no leeway) and required claims.
    /// Any failure yields `None`.
    pub fn decode(&self, token: &str) -> Option<Claims> {
        if self.secret.is_empty() {
            return None;
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!("Rejected JWT: {}", e);
                None
            }
        }
    }
}
