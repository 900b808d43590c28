use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Resolves the caller from a bearer token or an API key and injects the
/// resulting [`AuthUser`] into request extensions. Runs before every
/// protected handler.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = authenticate(&state, request.headers()).await?;
    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    if let Some(token) = extract_bearer_token(headers) {
        return state.auth.verify_token(&token).await.ok_or_else(|| {
            tracing::warn!("Rejected invalid or expired bearer token");
            ApiError::unauthorized("Недействительный или истекший токен!")
        });
    }

    if let Some(api_key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return state.auth.identify_api_key(api_key).await?.ok_or_else(|| {
            tracing::warn!("Rejected unknown API key");
            ApiError::forbidden("Неверный API ключ")
        });
    }

    Err(ApiError::unauthorized("Отсутствует токен! Требуется аутентификация."))
}

/// `Authorization: Bearer <token>`; the scheme is case-insensitive.
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => {
            Some(token.to_string())
        }
        _ => None,
    }
}

/// Guard for admin-only operations.
pub fn ensure_admin(user: &AuthUser) -> Result<(), ApiError> {
    if user.is_admin {
        Ok(())
    } else {
        tracing::warn!("User '{}' attempted an admin-only operation", user.username);
        Err(ApiError::forbidden("Недостаточно прав: требуется администратор"))
    }
}
