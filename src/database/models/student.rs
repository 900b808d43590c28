use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use validator::Validate;

use crate::database::manager::DatabaseError;
use crate::database::models::group::group_id_by_name;
use crate::database::repository::{delete_by_id, Labels, Repository};
use crate::filter::{FilterOrder, ListQuery, SortField};
use crate::validation::short_text;

const SELECT_STUDENTS: &str =
    "SELECT s.id, s.first_name, s.middle_name, s.last_name, s.age, g.group_name \
     FROM students s LEFT JOIN student_groups g ON g.id = s.group_id";

#[derive(Debug, Clone, FromRow)]
pub struct StudentRow {
    pub id: i64,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub age: Option<i64>,
    pub group_name: Option<String>,
}

/// Wire shape of a student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentView {
    pub id: i64,
    pub name: String,
    pub group: Option<String>,
    pub age: Option<i64>,
    pub middle_name: Option<String>,
}

impl From<StudentRow> for StudentView {
    fn from(row: StudentRow) -> Self {
        Self {
            id: row.id,
            name: format!("{} {}", row.first_name, row.last_name),
            group: row.group_name,
            age: row.age,
            middle_name: row.middle_name,
        }
    }
}

/// Create/update body. `group` is the group name; update replaces every
/// field, so an omitted optional field is stored as null.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StudentPayload {
    #[validate(custom(function = "short_text"))]
    pub first_name: String,
    #[validate(custom(function = "short_text"))]
    pub last_name: String,
    #[serde(default)]
    #[validate(custom(function = "short_text"))]
    pub middle_name: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, max = 120))]
    pub age: Option<i64>,
    #[serde(default)]
    #[validate(custom(function = "short_text"))]
    pub group: Option<String>,
}

pub struct Students;

impl Students {
    async fn resolve_group(
        conn: &mut SqliteConnection,
        group: Option<&str>,
    ) -> Result<Option<i64>, DatabaseError> {
        match group {
            Some(name) => group_id_by_name(conn, name)
                .await?
                .map(Some)
                .ok_or_else(|| DatabaseError::NotFound("Группа не найдена".to_string())),
            None => Ok(None),
        }
    }

    /// Students of every group `teacher_id` is assigned to.
    pub async fn taught_by(
        conn: &mut SqliteConnection,
        teacher_id: i64,
    ) -> Result<Vec<StudentView>, DatabaseError> {
        let rows = sqlx::query_as::<_, StudentRow>(&format!(
            "{} JOIN teachers_groups tg ON tg.group_id = s.group_id \
             WHERE tg.teacher_id = ? ORDER BY s.id ASC",
            SELECT_STUDENTS
        ))
        .bind(teacher_id)
        .fetch_all(conn)
        .await?;

        Ok(rows.into_iter().map(StudentView::from).collect())
    }
}

#[async_trait]
impl Repository for Students {
    type Payload = StudentPayload;
    type View = StudentView;

    const LABELS: Labels = Labels {
        collection: "students",
        not_found: "Студент не найден",
        deleted: "Студент успешно удален",
    };
    const SORT_FIELDS: &'static [SortField] = &[
        SortField::new("last_name", "s.last_name"),
        SortField::new("age", "s.age"),
        SortField::new("group", "g.group_name"),
    ];
    const FILTERABLE: bool = true;

    async fn find(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<StudentView>, DatabaseError> {
        let row = sqlx::query_as::<_, StudentRow>(&format!("{} WHERE s.id = ?", SELECT_STUDENTS))
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row.map(StudentView::from))
    }

    async fn list(
        conn: &mut SqliteConnection,
        query: &ListQuery,
    ) -> Result<Vec<StudentView>, DatabaseError> {
        let group_id = match query.filter.as_deref() {
            Some(name) => Self::resolve_group(&mut *conn, Some(name)).await?,
            None => None,
        };

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_STUDENTS);
        if let Some(group_id) = group_id {
            builder.push(" WHERE s.group_id = ").push_bind(group_id);
        }
        builder.push(FilterOrder::generate(query.order.as_ref(), "s.id"));

        let rows = builder.build_query_as::<StudentRow>().fetch_all(conn).await?;
        Ok(rows.into_iter().map(StudentView::from).collect())
    }

    async fn insert(
        conn: &mut SqliteConnection,
        payload: &StudentPayload,
    ) -> Result<i64, DatabaseError> {
        let group_id = Self::resolve_group(&mut *conn, payload.group.as_deref()).await?;

        let result = sqlx::query(
            "INSERT INTO students (first_name, middle_name, last_name, age, group_id)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(payload.first_name.trim())
        .bind(payload.middle_name.as_deref().map(str::trim))
        .bind(payload.last_name.trim())
        .bind(payload.age)
        .bind(group_id)
        .execute(conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        payload: &StudentPayload,
    ) -> Result<(), DatabaseError> {
        let group_id = Self::resolve_group(&mut *conn, payload.group.as_deref()).await?;

        sqlx::query(
            "UPDATE students
             SET first_name = ?, middle_name = ?, last_name = ?, age = ?, group_id = ?
             WHERE id = ?",
        )
        .bind(payload.first_name.trim())
        .bind(payload.middle_name.as_deref().map(str::trim))
        .bind(payload.last_name.trim())
        .bind(payload.age)
        .bind(group_id)
        .bind(id)
        .execute(conn)
        .await?;

        Ok(())
    }

    async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, DatabaseError> {
        delete_by_id(conn, "students", id).await
    }
}
