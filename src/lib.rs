pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod validation;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::database::models::{Groups, Professions, StudentCards, Students, Teachers};
use crate::database::Repository;
use crate::handlers::{protected, public};
use crate::middleware::require_auth;
pub use crate::state::AppState;

/// Full application router over `state`.
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth_routes())
        .merge(crud_routes::<Students>("student", "students"))
        .merge(crud_routes::<Groups>("group", "groups"))
        .merge(crud_routes::<Teachers>("teacher", "teachers"))
        .merge(crud_routes::<Professions>("profession", "professions"))
        .merge(crud_routes::<StudentCards>("card", "cards"))
        .merge(teacher_relation_routes())
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(auth_public_routes())
        // Protected API
        .merge(protected)
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(public::login))
        .route("/api/auth/register", post(public::register))
}

fn auth_routes() -> Router<AppState> {
    Router::new().route("/api/auth/whoami", get(protected::whoami))
}

/// The five entity routes: `/api/{singular}/:id[/update|/delete]`,
/// `/api/{plural}` and `/api/{plural}/create`.
fn crud_routes<R: Repository>(singular: &str, plural: &str) -> Router<AppState> {
    use protected::crud;

    Router::new()
        .route(&format!("/api/{}", plural), get(crud::list::<R>))
        .route(&format!("/api/{}/create", plural), post(crud::create::<R>))
        .route(&format!("/api/{}/:id", singular), get(crud::read_one::<R>))
        .route(&format!("/api/{}/:id/update", singular), put(crud::update::<R>))
        .route(&format!("/api/{}/:id/delete", singular), delete(crud::delete::<R>))
}

fn teacher_relation_routes() -> Router<AppState> {
    use protected::teachers;

    Router::new()
        .route(
            "/api/teacher/:id/groups",
            get(teachers::groups_list).post(teachers::groups_assign),
        )
        .route("/api/teacher/:id/groups/:group_name", delete(teachers::groups_unassign))
        .route(
            "/api/teacher/:id/professions",
            get(teachers::professions_list).post(teachers::professions_add),
        )
        .route("/api/teacher/:id/students", get(teachers::students_list))
}
