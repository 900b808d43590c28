// handlers/public/auth.rs - POST /api/auth/login and POST /api/auth/register

use axum::extract::State;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use validator::Validate;

use crate::auth::IssuedToken;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Payload};
use crate::state::AppState;
use crate::validation::not_blank;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = "not_blank"))]
    pub username: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

/**
 * POST /api/auth/login - Exchange username and password for a bearer token
 *
 * Output: `{"access_token": "...", "token_type": "bearer", "expires_in": 3600}`
 */
pub async fn login(
    State(state): State<AppState>,
    Payload(request): Payload<LoginRequest>,
) -> ApiResult<IssuedToken> {
    if !state.auth.authenticate_user(&request.username, &request.password).await? {
        warn!("Failed login attempt for '{}'", request.username);
        return Err(ApiError::unauthorized("Неверное имя пользователя или пароль"));
    }

    let token = state.auth.generate_token(&request.username).await?;
    info!("Issued token for '{}'", request.username);
    Ok(ApiResponse::success(token))
}

/// POST /api/auth/register - Create a user account. `is_admin` is honoured
/// only while admin self-registration is enabled.
pub async fn register(
    State(state): State<AppState>,
    Payload(request): Payload<RegisterRequest>,
) -> ApiResult<Value> {
    request.validate()?;

    if request.is_admin && !state.auth.allows_admin_registration() {
        warn!("Rejected admin self-registration for '{}'", request.username);
        return Err(ApiError::forbidden("Регистрация администраторов запрещена"));
    }

    let username = request.username.trim();
    if !state.auth.register_user(username, &request.password, request.is_admin).await? {
        return Err(ApiError::bad_request("Пользователь с таким именем уже существует"));
    }

    info!("Registered user '{}' (admin: {})", username, request.is_admin);
    Ok(ApiResponse::message("Пользователь успешно зарегистрирован"))
}
