use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::SqliteConnection;
use validator::Validate;

use crate::database::manager::DatabaseError;
use crate::filter::{ListQuery, SortField};

/// User-facing strings for one entity.
#[derive(Debug, Clone, Copy)]
pub struct Labels {
    /// Key of the array in list responses, e.g. `students`.
    pub collection: &'static str,
    pub not_found: &'static str,
    pub deleted: &'static str,
}

/// Capability interface behind the generic CRUD handlers. Every method takes
/// a plain connection so callers decide whether it runs inside a transaction.
///
/// `insert` and `update` resolve natural-key references themselves and fail
/// with [`DatabaseError::NotFound`] when one does not resolve.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    type Payload: DeserializeOwned + Validate + Send + Sync + 'static;
    type View: Serialize + Send + 'static;

    const LABELS: Labels;
    const SORT_FIELDS: &'static [SortField];
    /// Whether the `filter` list parameter means anything for this entity.
    const FILTERABLE: bool;

    async fn find(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<Self::View>, DatabaseError>;

    async fn list(
        conn: &mut SqliteConnection,
        query: &ListQuery,
    ) -> Result<Vec<Self::View>, DatabaseError>;

    async fn insert(
        conn: &mut SqliteConnection,
        payload: &Self::Payload,
    ) -> Result<i64, DatabaseError>;

    async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        payload: &Self::Payload,
    ) -> Result<(), DatabaseError>;

    /// Returns `false` when no row was removed.
    async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, DatabaseError>;

    async fn exists(conn: &mut SqliteConnection, id: i64) -> Result<bool, DatabaseError> {
        Ok(Self::find(conn, id).await?.is_some())
    }
}

/// Delete by primary key from `table`. `table` always comes from a constant.
pub(crate) async fn delete_by_id(
    conn: &mut SqliteConnection,
    table: &'static str,
    id: i64,
) -> Result<bool, DatabaseError> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", table))
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
