use serde::{Deserialize, Serialize};
use std::env;

use crate::auth::api_key::{ApiKeyRecord, Role};

/// Longest accepted JWT lifetime: one year.
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub app: AppInfo,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Metadata reported by the root endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub spec_path: String,
    pub docs_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub password_hash_rounds: u32,
    pub admin_username: String,
    #[serde(skip_serializing)]
    pub admin_password: String,
    pub allow_admin_registration: bool,
    #[serde(skip_serializing)]
    pub api_keys: Vec<ApiKeyRecord>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Application metadata
        if let Ok(v) = env::var("APP_NAME") {
            self.app.name = v;
        }
        if let Ok(v) = env::var("APP_VERSION") {
            self.app.version = v;
        }
        if let Ok(v) = env::var("API_SPEC_PATH") {
            self.app.spec_path = v;
        }
        if let Ok(v) = env::var("API_DOCS_PATH") {
            self.app.docs_path = v;
        }

        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout =
                v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET_KEY") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRATION") {
            if let Some(ttl) = parse_token_ttl(&v) {
                self.security.jwt_expiration_secs = ttl;
            }
        }
        if let Ok(v) = env::var("PASSWORD_HASH_ROUNDS") {
            self.security.password_hash_rounds =
                v.parse().unwrap_or(self.security.password_hash_rounds);
        }
        if let Ok(v) = env::var("ADMIN_USERNAME") {
            self.security.admin_username = v;
        }
        if let Ok(v) = env::var("ADMIN_PASSWORD") {
            self.security.admin_password = v;
        }
        if let Ok(v) = env::var("ALLOW_ADMIN_REGISTRATION") {
            self.security.allow_admin_registration =
                v.parse().unwrap_or(self.security.allow_admin_registration);
        }
        if let Ok(v) = env::var("API_KEYS") {
            self.security.api_keys = parse_api_keys(&v);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            app: AppInfo::default(),
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                url: "sqlite://students_new.db".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                jwt_secret: "dev-secret-change-me".to_string(),
                jwt_expiration_secs: 3600,
                password_hash_rounds: 100_000,
                admin_username: "admin".to_string(),
                admin_password: "password".to_string(),
                allow_admin_registration: true,
                api_keys: vec![
                    ApiKeyRecord::new("admin", r"asfd234U*(&*#@$@#$sf---)", Role::Admin),
                    ApiKeyRecord::new("user1", r"aasdfJLs13&^^%%^ads!!fs", Role::User),
                ],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            app: AppInfo::default(),
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                url: "sqlite://students_staging.db".to_string(),
                max_connections: 10,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiration_secs: 3600,
                password_hash_rounds: 200_000,
                admin_username: "admin".to_string(),
                admin_password: String::new(),
                allow_admin_registration: false,
                api_keys: Vec::new(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            app: AppInfo::default(),
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "sqlite://students.db".to_string(),
                max_connections: 20,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiration_secs: 900,
                password_hash_rounds: 600_000,
                admin_username: "admin".to_string(),
                admin_password: String::new(),
                allow_admin_registration: false,
                api_keys: Vec::new(),
            },
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: "Students API".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            spec_path: "/api/openapi.json".to_string(),
            docs_path: "/api/docs".to_string(),
        }
    }
}

/// Token lifetime in seconds, within `1..=MAX_TOKEN_TTL_SECS`. Anything
/// else is rejected with a warning and the default stays.
pub fn parse_token_ttl(raw: &str) -> Option<u64> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if (1..=MAX_TOKEN_TTL_SECS).contains(&secs) => Some(secs),
        _ => {
            tracing::warn!(
                "Ignoring JWT_EXPIRATION={:?}; expected 1..={} seconds",
                raw,
                MAX_TOKEN_TTL_SECS
            );
            None
        }
    }
}

/// Parses `username:role:key` entries separated by commas. Malformed entries
/// are skipped with a warning.
pub fn parse_api_keys(raw: &str) -> Vec<ApiKeyRecord> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let mut parts = entry.splitn(3, ':');
            let (username, role, key) = (parts.next()?, parts.next()?, parts.next()?);
            match role.parse::<Role>() {
                Ok(role) if !username.is_empty() && !key.is_empty() => {
                    Some(ApiKeyRecord::new(username, key, role))
                }
                _ => {
                    tracing::warn!("Skipping malformed API_KEYS entry for '{}'", username);
                    None
                }
            }
        })
        .collect()
}

#[macro_export]
macro_rules! is_production {
    ($config:expr) => {
        matches!($config.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.security.jwt_expiration_secs, 3600);
        assert!(config.security.allow_admin_registration);
        assert_eq!(config.security.api_keys.len(), 2);
        assert!(!is_production!(config));
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.security.jwt_secret.is_empty());
        assert!(!config.security.allow_admin_registration);
        assert!(config.security.api_keys.is_empty());
        assert!(is_production!(config));
    }

    #[test]
    fn parses_api_key_list() {
        let keys = parse_api_keys("root:admin:k1:with:colons, bob:user:k2,broken,eve:owner:k3");
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].username, "root");
        assert_eq!(keys[0].api_key, "k1:with:colons");
        assert_eq!(keys[0].role, Role::Admin);
        assert_eq!(keys[1].role, Role::User);
    }

    #[test]
    fn token_ttl_must_be_in_range() {
        assert_eq!(parse_token_ttl("900"), Some(900));
        assert_eq!(parse_token_ttl(" 3600 "), Some(3600));
        assert_eq!(parse_token_ttl(&MAX_TOKEN_TTL_SECS.to_string()), Some(MAX_TOKEN_TTL_SECS));
        assert_eq!(parse_token_ttl("0"), None);
        assert_eq!(parse_token_ttl("-5"), None);
        assert_eq!(parse_token_ttl("18446744073709551615"), None);
        assert_eq!(parse_token_ttl("soon"), None);
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let config = AppConfig::development();
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
    }
}
