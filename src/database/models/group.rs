use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use validator::Validate;

use crate::database::manager::DatabaseError;
use crate::database::models::profession::profession_id_by_title;
use crate::database::repository::{delete_by_id, Labels, Repository};
use crate::filter::{FilterOrder, ListQuery, SortField};
use crate::validation::{end_not_before_start, long_text, short_text};

const SELECT_GROUPS: &str =
    "SELECT g.id, g.group_name, g.start_date, g.end_date, p.title AS profession \
     FROM student_groups g LEFT JOIN professions p ON p.id = g.profession_id";

const DUPLICATE_NAME: &str = "Группа с таким названием уже существует";

/// Natural-key lookup: group name → id.
pub async fn group_id_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<i64>, DatabaseError> {
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM student_groups WHERE group_name = ?")
        .bind(name.trim())
        .fetch_optional(conn)
        .await?;
    Ok(id)
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct GroupView {
    pub id: i64,
    pub group_name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub profession: Option<String>,
}

/// `profession` is the profession title. An omitted `start_date` means now
/// on create and "unchanged" on update; `end_date` is checked against that
/// effective start inside the write.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GroupPayload {
    #[validate(custom(function = "short_text"))]
    pub group_name: String,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    #[validate(custom(function = "long_text"))]
    pub profession: Option<String>,
}

pub struct Groups;

impl Groups {
    async fn resolve_profession(
        conn: &mut SqliteConnection,
        title: Option<&str>,
    ) -> Result<Option<i64>, DatabaseError> {
        match title {
            Some(title) => profession_id_by_title(conn, title)
                .await?
                .map(Some)
                .ok_or_else(|| DatabaseError::NotFound("Профессия не найдена".to_string())),
            None => Ok(None),
        }
    }

    async fn stored_start(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        let start = sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT start_date FROM student_groups WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(start)
    }
}

#[async_trait]
impl Repository for Groups {
    type Payload = GroupPayload;
    type View = GroupView;

    const LABELS: Labels = Labels {
        collection: "groups",
        not_found: "Группа не найдена",
        deleted: "Группа успешно удалена",
    };
    const SORT_FIELDS: &'static [SortField] = &[
        SortField::new("group_name", "g.group_name"),
        SortField::new("start_date", "g.start_date"),
    ];
    const FILTERABLE: bool = true;

    async fn find(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<GroupView>, DatabaseError> {
        let group = sqlx::query_as::<_, GroupView>(&format!("{} WHERE g.id = ?", SELECT_GROUPS))
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(group)
    }

    async fn list(
        conn: &mut SqliteConnection,
        query: &ListQuery,
    ) -> Result<Vec<GroupView>, DatabaseError> {
        let profession_id = Self::resolve_profession(&mut *conn, query.filter.as_deref()).await?;

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_GROUPS);
        if let Some(profession_id) = profession_id {
            builder.push(" WHERE g.profession_id = ").push_bind(profession_id);
        }
        builder.push(FilterOrder::generate(query.order.as_ref(), "g.id"));

        Ok(builder.build_query_as::<GroupView>().fetch_all(conn).await?)
    }

    async fn insert(
        conn: &mut SqliteConnection,
        payload: &GroupPayload,
    ) -> Result<i64, DatabaseError> {
        let start_date = payload.start_date.unwrap_or_else(Utc::now);
        end_not_before_start(start_date, payload.end_date)?;
        let profession_id =
            Self::resolve_profession(&mut *conn, payload.profession.as_deref()).await?;

        let result = sqlx::query(
            "INSERT INTO student_groups (group_name, start_date, end_date, profession_id)
             VALUES (?, ?, ?, ?)",
        )
        .bind(payload.group_name.trim())
        .bind(start_date)
        .bind(payload.end_date)
        .bind(profession_id)
        .execute(conn)
        .await
        .map_err(|e| DatabaseError::unique(e, DUPLICATE_NAME))?;

        Ok(result.last_insert_rowid())
    }

    async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        payload: &GroupPayload,
    ) -> Result<(), DatabaseError> {
        let start_date = match payload.start_date {
            Some(start) => Some(start),
            None => Self::stored_start(&mut *conn, id).await?,
        };
        if let Some(start_date) = start_date {
            end_not_before_start(start_date, payload.end_date)?;
        }
        let profession_id =
            Self::resolve_profession(&mut *conn, payload.profession.as_deref()).await?;

        sqlx::query(
            "UPDATE student_groups
             SET group_name = ?, start_date = COALESCE(?, start_date),
                 end_date = ?, profession_id = ?
             WHERE id = ?",
        )
        .bind(payload.group_name.trim())
        .bind(start_date)
        .bind(payload.end_date)
        .bind(profession_id)
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| DatabaseError::unique(e, DUPLICATE_NAME))?;

        Ok(())
    }

    async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, DatabaseError> {
        delete_by_id(conn, "student_groups", id).await
    }
}
