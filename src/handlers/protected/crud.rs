// handlers/protected/crud.rs - Generic entity handlers
//
// One set of handlers serves every entity; the `Repository` impl supplies
// the SQL, the validation rules and the user-facing messages.
//
//   GET    /api/{entity}/:id          read_one
//   GET    /api/{entities}            list
//   POST   /api/{entities}/create     create
//   PUT    /api/{entity}/:id/update   update
//   DELETE /api/{entity}/:id/delete   delete (admin only)

use axum::{extract::State, Extension};
use serde_json::Value;
use tracing::{error, info};
use validator::Validate;

use crate::auth::AuthUser;
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::{FilterError, FilterOrder, ListParams, ListQuery};
use crate::middleware::{
    ensure_admin, ApiResponse, ApiResult, Collection, PathParam, Payload, QueryParams,
};
use crate::state::AppState;

pub async fn read_one<R: Repository>(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<R::View> {
    let mut conn = state.db.pool().acquire().await?;

    let view = R::find(&mut *conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found(R::LABELS.not_found))?;

    Ok(ApiResponse::success(view))
}

/// Sorting and filtering are checked before a connection is taken, so a
/// bad `param` never reaches the database.
pub async fn list<R: Repository>(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<Collection<R::View>> {
    let order = FilterOrder::validate_and_parse(
        params.param.as_deref(),
        params.order.as_deref(),
        R::SORT_FIELDS,
    )?;

    let filter = params
        .filter
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty());
    if filter.is_some() && !R::FILTERABLE {
        return Err(FilterError::FilterNotSupported(R::LABELS.collection).into());
    }

    let mut conn = state.db.pool().acquire().await?;
    let items = R::list(&mut *conn, &ListQuery { order, filter }).await?;

    Ok(ApiResponse::collection(R::LABELS.collection, items))
}

/// Reference lookups and the insert share one transaction; a reference that
/// does not resolve rolls everything back.
pub async fn create<R: Repository>(
    State(state): State<AppState>,
    Payload(payload): Payload<R::Payload>,
) -> ApiResult<R::View> {
    payload.validate()?;

    let mut tx = state.db.pool().begin().await?;
    let id = R::insert(&mut *tx, &payload).await?;
    let view = reload::<R>(&mut tx, id).await?;
    tx.commit().await?;

    info!("Created {} #{}", R::LABELS.collection, id);
    Ok(ApiResponse::created(view))
}

pub async fn update<R: Repository>(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
    Payload(payload): Payload<R::Payload>,
) -> ApiResult<R::View> {
    let mut tx = state.db.pool().begin().await?;
    if !R::exists(&mut *tx, id).await? {
        return Err(ApiError::not_found(R::LABELS.not_found));
    }

    payload.validate()?;

    R::update(&mut *tx, id, &payload).await?;
    let view = reload::<R>(&mut tx, id).await?;
    tx.commit().await?;

    info!("Updated {} #{}", R::LABELS.collection, id);
    Ok(ApiResponse::success(view))
}

pub async fn delete<R: Repository>(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Value> {
    ensure_admin(&user)?;

    let mut conn = state.db.pool().acquire().await?;
    if !R::delete(&mut *conn, id).await? {
        return Err(ApiError::not_found(R::LABELS.not_found));
    }

    info!("User '{}' deleted {} #{}", user.username, R::LABELS.collection, id);
    Ok(ApiResponse::message(R::LABELS.deleted))
}

async fn reload<R: Repository>(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    id: i64,
) -> Result<R::View, ApiError> {
    R::find(&mut **tx, id).await?.ok_or_else(|| {
        error!("{} #{} vanished inside its own transaction", R::LABELS.collection, id);
        ApiError::internal_server_error(R::LABELS.not_found)
    })
}
