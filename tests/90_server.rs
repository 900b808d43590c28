mod common;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use students_api::AppState;

struct TestServer {
    base_url: String,
}

impl TestServer {
    /// Serve the real router on a free local port for the rest of the test.
    async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let addr = SocketAddr::from(([127, 0, 0, 1], port));

        let state = AppState::initialize(common::test_config()).await?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let app = students_api::app(state);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
        })
    }
}

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/health", server.base_url)).send().await?;

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn login_over_http_then_create_student() -> Result<()> {
    let server = TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/auth/login", server.base_url))
        .json(&json!({ "username": common::ADMIN_USERNAME, "password": common::ADMIN_PASSWORD }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let token = res.json::<Value>().await?["access_token"]
        .as_str()
        .context("no access_token")?
        .to_string();

    let res = client
        .post(format!("{}/api/students/create", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "first_name": "Ivan", "last_name": "Ivanov", "age": 20 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created = res.json::<Value>().await?;
    assert_eq!(created["name"], "Ivan Ivanov");

    let res = client
        .get(format!("{}/api/students", server.base_url))
        .header("x-api-key", common::USER_KEY)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let listed = res.json::<Value>().await?;
    assert_eq!(listed["students"].as_array().map(Vec::len), Some(1));
    Ok(())
}
