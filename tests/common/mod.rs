#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use students_api::config::AppConfig;
use students_api::AppState;

pub const ADMIN_KEY: &str = r"asfd234U*(&*#@$@#$sf---)";
pub const USER_KEY: &str = r"aasdfJLs13&^^%%^ads!!fs";
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "password";

/// Development defaults over a private in-memory database, with cheap
/// password hashing.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.database.url = "sqlite::memory:".to_string();
    config.database.connection_timeout = 5;
    config.security.password_hash_rounds = 1_000;
    config
}

#[derive(Debug, Clone)]
pub enum Credential {
    Anonymous,
    ApiKey(String),
    Bearer(String),
}

impl Credential {
    pub fn admin_key() -> Self {
        Credential::ApiKey(ADMIN_KEY.to_string())
    }

    pub fn user_key() -> Self {
        Credential::ApiKey(USER_KEY.to_string())
    }
}

/// The real router over a fresh database, driven in-process.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: AppConfig) -> Result<Self> {
        let state = AppState::initialize(config).await?;
        let router = students_api::app(state.clone());
        Ok(Self { router, state })
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        credential: &Credential,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        match credential {
            Credential::Anonymous => {}
            Credential::ApiKey(key) => builder = builder.header("x-api-key", key.as_str()),
            Credential::Bearer(token) => {
                builder = builder.header("authorization", format!("Bearer {}", token))
            }
        }

        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&value)?)
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body)?).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        Ok((status, value))
    }

    // Shorthands authenticated with the admin API key.

    pub async fn get(&self, uri: &str) -> Result<(StatusCode, Value)> {
        self.call(Method::GET, uri, &Credential::admin_key(), None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::POST, uri, &Credential::admin_key(), Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::PUT, uri, &Credential::admin_key(), Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> Result<(StatusCode, Value)> {
        self.call(Method::DELETE, uri, &Credential::admin_key(), None).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/login",
                &Credential::Anonymous,
                Some(json!({ "username": username, "password": password })),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed with {}: {}", status, body);
        body["access_token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no access_token")
    }

    pub async fn count(&self, table: &str) -> Result<i64> {
        self.scalar(&format!("SELECT COUNT(*) FROM {}", table)).await
    }

    /// Runs a single-integer query straight against the pool.
    pub async fn scalar(&self, sql: &str) -> Result<i64> {
        let value = sqlx::query_scalar::<_, i64>(sql)
            .fetch_one(self.state.db.pool())
            .await?;
        Ok(value)
    }

    // Seeding helpers; each asserts the create succeeded and returns the id.

    pub async fn seed(&self, collection: &str, body: Value) -> Result<i64> {
        let (status, created) = self.post(&format!("/api/{}/create", collection), body).await?;
        anyhow::ensure!(
            status == StatusCode::CREATED,
            "seeding {} failed with {}: {}",
            collection,
            status,
            created
        );
        created["id"].as_i64().context("created entity has no id")
    }

    pub async fn seed_profession(&self, title: &str) -> Result<i64> {
        self.seed("professions", json!({ "title": title })).await
    }

    pub async fn seed_group(&self, name: &str) -> Result<i64> {
        self.seed(
            "groups",
            json!({ "group_name": name, "start_date": "2024-09-01T00:00:00Z" }),
        )
        .await
    }

    pub async fn seed_student(
        &self,
        first_name: &str,
        last_name: &str,
        group: Option<&str>,
    ) -> Result<i64> {
        self.seed(
            "students",
            json!({
                "first_name": first_name,
                "last_name": last_name,
                "age": 20,
                "group": group
            }),
        )
        .await
    }

    pub async fn seed_teacher(&self, first_name: &str, last_name: &str) -> Result<i64> {
        self.seed(
            "teachers",
            json!({ "first_name": first_name, "last_name": last_name, "phone": "+79990001122" }),
        )
        .await
    }
}
