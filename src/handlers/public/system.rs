// handlers/public/system.rs - GET / and GET /health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// Service description with the route map.
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let app = &state.config.app;

    Json(json!({
        "success": true,
        "data": {
            "name": app.name,
            "version": app.version,
            "environment": state.config.environment,
            "description": "REST API for students, groups, teachers, professions and student cards",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth":
                    "/api/auth/login, /api/auth/register (public), /api/auth/whoami (protected)",
                "students": "/api/students, /api/student/:id (protected)",
                "groups": "/api/groups, /api/group/:id (protected)",
                "teachers":
                    "/api/teachers, /api/teacher/:id[/groups|/professions|/students] (protected)",
                "professions": "/api/professions, /api/profession/:id (protected)",
                "cards": "/api/cards, /api/card/:id (protected)",
            },
            "documentation": {
                "spec": app.spec_path,
                "docs": app.docs_path,
            }
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.db.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "База данных недоступна",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": e.to_string()
                    }
                })),
            )
        }
    }
}
