// handlers/protected/auth.rs - GET /api/auth/whoami

use axum::Extension;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::middleware::{ApiResponse, ApiResult};

pub async fn whoami(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "success": true,
        "user": user,
    })))
}
