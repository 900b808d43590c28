use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use validator::Validate;

use crate::database::manager::DatabaseError;
use crate::database::repository::{delete_by_id, Labels, Repository};
use crate::filter::{FilterOrder, ListQuery, SortField};
use crate::validation::long_text;

/// Natural-key lookup: profession title → id.
pub async fn profession_id_by_title(
    conn: &mut SqliteConnection,
    title: &str,
) -> Result<Option<i64>, DatabaseError> {
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM professions WHERE title = ?")
        .bind(title.trim())
        .fetch_optional(conn)
        .await?;
    Ok(id)
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ProfessionView {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProfessionPayload {
    #[validate(custom(function = "long_text"))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

pub struct Professions;

#[async_trait]
impl Repository for Professions {
    type Payload = ProfessionPayload;
    type View = ProfessionView;

    const LABELS: Labels = Labels {
        collection: "professions",
        not_found: "Профессия не найдена",
        deleted: "Профессия успешно удалена",
    };
    const SORT_FIELDS: &'static [SortField] = &[SortField::new("title", "title")];
    const FILTERABLE: bool = false;

    async fn find(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<ProfessionView>, DatabaseError> {
        let profession = sqlx::query_as::<_, ProfessionView>(
            "SELECT id, title, description FROM professions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(profession)
    }

    async fn list(
        conn: &mut SqliteConnection,
        query: &ListQuery,
    ) -> Result<Vec<ProfessionView>, DatabaseError> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, title, description FROM professions");
        builder.push(FilterOrder::generate(query.order.as_ref(), "id"));
        Ok(builder.build_query_as::<ProfessionView>().fetch_all(conn).await?)
    }

    async fn insert(
        conn: &mut SqliteConnection,
        payload: &ProfessionPayload,
    ) -> Result<i64, DatabaseError> {
        let result = sqlx::query("INSERT INTO professions (title, description) VALUES (?, ?)")
            .bind(payload.title.trim())
            .bind(payload.description.as_deref())
            .execute(conn)
            .await
            .map_err(|e| DatabaseError::unique(e, "Профессия с таким названием уже существует"))?;
        Ok(result.last_insert_rowid())
    }

    async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        payload: &ProfessionPayload,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE professions SET title = ?, description = ? WHERE id = ?")
            .bind(payload.title.trim())
            .bind(payload.description.as_deref())
            .bind(id)
            .execute(conn)
            .await
            .map_err(|e| DatabaseError::unique(e, "Профессия с таким названием уже существует"))?;
        Ok(())
    }

    async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, DatabaseError> {
        delete_by_id(conn, "professions", id).await
    }
}
