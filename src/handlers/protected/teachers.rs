// handlers/protected/teachers.rs - Teacher relation endpoints
//
//   GET    /api/teacher/:id/groups               groups_list
//   POST   /api/teacher/:id/groups               groups_assign
//   DELETE /api/teacher/:id/groups/:group_name   groups_unassign (admin only)
//   GET    /api/teacher/:id/professions          professions_list
//   POST   /api/teacher/:id/professions          professions_add
//   GET    /api/teacher/:id/students             students_list

use axum::{extract::State, Extension};
use serde_json::Value;
use sqlx::SqliteConnection;
use tracing::info;
use validator::Validate;

use crate::auth::AuthUser;
use crate::database::models::teacher::{
    AssignGroupPayload, QualificationPayload, TeacherGroupView, TeacherProfessionView, Teachers,
};
use crate::database::models::{StudentView, Students};
use crate::database::Repository;
use crate::error::ApiError;
use crate::middleware::{ensure_admin, ApiResponse, ApiResult, Collection, PathParam, Payload};
use crate::state::AppState;

async fn ensure_teacher(conn: &mut SqliteConnection, id: i64) -> Result<(), ApiError> {
    if Teachers::exists(conn, id).await? {
        Ok(())
    } else {
        Err(ApiError::not_found(Teachers::LABELS.not_found))
    }
}

pub async fn groups_list(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Collection<TeacherGroupView>> {
    let mut conn = state.db.pool().acquire().await?;
    ensure_teacher(&mut conn, id).await?;

    let groups = Teachers::groups(&mut conn, id).await?;
    Ok(ApiResponse::collection("groups", groups))
}

pub async fn groups_assign(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
    Payload(payload): Payload<AssignGroupPayload>,
) -> ApiResult<TeacherGroupView> {
    payload.validate()?;

    let mut tx = state.db.pool().begin().await?;
    ensure_teacher(&mut tx, id).await?;
    let assignment = Teachers::assign_group(&mut tx, id, &payload).await?;
    tx.commit().await?;

    info!("Assigned group '{}' to teacher #{}", payload.group.trim(), id);
    Ok(ApiResponse::created(assignment))
}

pub async fn groups_unassign(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParam((id, group_name)): PathParam<(i64, String)>,
) -> ApiResult<Value> {
    ensure_admin(&user)?;

    let mut conn = state.db.pool().acquire().await?;
    ensure_teacher(&mut conn, id).await?;

    if !Teachers::unassign_group(&mut conn, id, &group_name).await? {
        return Err(ApiError::not_found("Преподаватель не ведет эту группу"));
    }

    info!(
        "User '{}' removed group '{}' from teacher #{}",
        user.username, group_name, id
    );
    Ok(ApiResponse::message("Группа успешно снята с преподавателя"))
}

pub async fn professions_list(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Collection<TeacherProfessionView>> {
    let mut conn = state.db.pool().acquire().await?;
    ensure_teacher(&mut conn, id).await?;

    let professions = Teachers::professions(&mut conn, id).await?;
    Ok(ApiResponse::collection("professions", professions))
}

pub async fn professions_add(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
    Payload(payload): Payload<QualificationPayload>,
) -> ApiResult<TeacherProfessionView> {
    payload.validate()?;

    let mut tx = state.db.pool().begin().await?;
    ensure_teacher(&mut tx, id).await?;
    let qualification = Teachers::add_profession(&mut tx, id, &payload).await?;
    tx.commit().await?;

    info!("Added profession '{}' to teacher #{}", payload.profession.trim(), id);
    Ok(ApiResponse::created(qualification))
}

/// Students of every group the teacher is assigned to.
pub async fn students_list(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Collection<StudentView>> {
    let mut conn = state.db.pool().acquire().await?;
    ensure_teacher(&mut conn, id).await?;

    let students = Students::taught_by(&mut conn, id).await?;
    Ok(ApiResponse::collection("students", students))
}
