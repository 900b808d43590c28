use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use validator::Validate;

use crate::database::manager::DatabaseError;
use crate::database::models::group::group_id_by_name;
use crate::database::models::profession::profession_id_by_title;
use crate::database::repository::{delete_by_id, Labels, Repository};
use crate::filter::{FilterOrder, ListQuery, SortField};
use crate::validation::{long_text, phone, short_text};

const SELECT_TEACHERS: &str =
    "SELECT t.id, t.first_name, t.middle_name, t.last_name, t.age, t.phone, t.email \
     FROM teachers t";

#[derive(Debug, Clone, FromRow)]
pub struct TeacherRow {
    pub id: i64,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub age: Option<i64>,
    pub phone: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeacherView {
    pub id: i64,
    pub name: String,
    pub middle_name: Option<String>,
    pub age: Option<i64>,
    pub phone: String,
    pub email: Option<String>,
}

impl From<TeacherRow> for TeacherView {
    fn from(row: TeacherRow) -> Self {
        Self {
            id: row.id,
            name: format!("{} {}", row.first_name, row.last_name),
            middle_name: row.middle_name,
            age: row.age,
            phone: row.phone,
            email: row.email,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TeacherPayload {
    #[validate(custom(function = "long_text"))]
    pub first_name: String,
    #[validate(custom(function = "long_text"))]
    pub last_name: String,
    #[serde(default)]
    #[validate(custom(function = "long_text"))]
    pub middle_name: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, max = 120))]
    pub age: Option<i64>,
    #[validate(custom(function = "phone"))]
    pub phone: String,
    #[serde(default)]
    #[validate(email, length(max = 50))]
    pub email: Option<String>,
}

// --- Join entities -------------------------------------------------------

/// A TeacherGroup row. `group` is null once the group has been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct TeacherGroupView {
    #[serde(rename = "group")]
    pub group_name: Option<String>,
    pub date_start: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignGroupPayload {
    #[validate(custom(function = "short_text"))]
    pub group: String,
    #[serde(default)]
    pub date_start: Option<DateTime<Utc>>,
}

/// A TeacherProfession row with its qualification notes.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct TeacherProfessionView {
    pub profession: Option<String>,
    pub notions: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QualificationPayload {
    #[validate(custom(function = "long_text"))]
    pub profession: String,
    #[serde(default)]
    pub notions: Option<String>,
}

pub struct Teachers;

impl Teachers {
    pub async fn groups(
        conn: &mut SqliteConnection,
        teacher_id: i64,
    ) -> Result<Vec<TeacherGroupView>, DatabaseError> {
        let groups = sqlx::query_as::<_, TeacherGroupView>(
            "SELECT g.group_name, tg.date_start
             FROM teachers_groups tg LEFT JOIN student_groups g ON g.id = tg.group_id
             WHERE tg.teacher_id = ?
             ORDER BY tg.date_start ASC",
        )
        .bind(teacher_id)
        .fetch_all(conn)
        .await?;
        Ok(groups)
    }

    pub async fn assign_group(
        conn: &mut SqliteConnection,
        teacher_id: i64,
        payload: &AssignGroupPayload,
    ) -> Result<TeacherGroupView, DatabaseError> {
        let group_id = group_id_by_name(&mut *conn, &payload.group)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Группа не найдена".to_string()))?;
        let date_start = payload.date_start.unwrap_or_else(Utc::now);

        sqlx::query(
            "INSERT INTO teachers_groups (teacher_id, group_id, date_start) VALUES (?, ?, ?)",
        )
        .bind(teacher_id)
        .bind(group_id)
        .bind(date_start)
        .execute(conn)
        .await
        .map_err(|e| DatabaseError::unique(e, "Преподаватель уже ведет эту группу"))?;

        Ok(TeacherGroupView {
            group_name: Some(payload.group.trim().to_string()),
            date_start,
        })
    }

    /// Returns `false` when the teacher was not assigned to the group.
    pub async fn unassign_group(
        conn: &mut SqliteConnection,
        teacher_id: i64,
        group_name: &str,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "DELETE FROM teachers_groups
             WHERE teacher_id = ?
               AND group_id = (SELECT id FROM student_groups WHERE group_name = ?)",
        )
        .bind(teacher_id)
        .bind(group_name.trim())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn professions(
        conn: &mut SqliteConnection,
        teacher_id: i64,
    ) -> Result<Vec<TeacherProfessionView>, DatabaseError> {
        let professions = sqlx::query_as::<_, TeacherProfessionView>(
            "SELECT p.title AS profession, tp.notions
             FROM teachers_professions tp LEFT JOIN professions p ON p.id = tp.profession_id
             WHERE tp.teacher_id = ?
             ORDER BY p.title ASC",
        )
        .bind(teacher_id)
        .fetch_all(conn)
        .await?;
        Ok(professions)
    }

    pub async fn add_profession(
        conn: &mut SqliteConnection,
        teacher_id: i64,
        payload: &QualificationPayload,
    ) -> Result<TeacherProfessionView, DatabaseError> {
        let profession_id = profession_id_by_title(&mut *conn, &payload.profession)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Профессия не найдена".to_string()))?;

        sqlx::query(
            "INSERT INTO teachers_professions (teacher_id, profession_id, notions)
             VALUES (?, ?, ?)",
        )
        .bind(teacher_id)
        .bind(profession_id)
        .bind(payload.notions.as_deref())
        .execute(conn)
        .await
        .map_err(|e| DatabaseError::unique(e, "Профессия уже назначена преподавателю"))?;

        Ok(TeacherProfessionView {
            profession: Some(payload.profession.trim().to_string()),
            notions: payload.notions.clone(),
        })
    }
}

#[async_trait]
impl Repository for Teachers {
    type Payload = TeacherPayload;
    type View = TeacherView;

    const LABELS: Labels = Labels {
        collection: "teachers",
        not_found: "Преподаватель не найден",
        deleted: "Преподаватель успешно удален",
    };
    const SORT_FIELDS: &'static [SortField] = &[
        SortField::new("last_name", "t.last_name"),
        SortField::new("age", "t.age"),
    ];
    const FILTERABLE: bool = true;

    async fn find(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<TeacherView>, DatabaseError> {
        let row = sqlx::query_as::<_, TeacherRow>(&format!("{} WHERE t.id = ?", SELECT_TEACHERS))
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row.map(TeacherView::from))
    }

    async fn list(
        conn: &mut SqliteConnection,
        query: &ListQuery,
    ) -> Result<Vec<TeacherView>, DatabaseError> {
        let group_id = match query.filter.as_deref() {
            Some(name) => Some(
                group_id_by_name(&mut *conn, name)
                    .await?
                    .ok_or_else(|| DatabaseError::NotFound("Группа не найдена".to_string()))?,
            ),
            None => None,
        };

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_TEACHERS);
        if let Some(group_id) = group_id {
            builder
                .push(" JOIN teachers_groups tg ON tg.teacher_id = t.id WHERE tg.group_id = ")
                .push_bind(group_id);
        }
        builder.push(FilterOrder::generate(query.order.as_ref(), "t.id"));

        let rows = builder.build_query_as::<TeacherRow>().fetch_all(conn).await?;
        Ok(rows.into_iter().map(TeacherView::from).collect())
    }

    async fn insert(
        conn: &mut SqliteConnection,
        payload: &TeacherPayload,
    ) -> Result<i64, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO teachers (first_name, middle_name, last_name, age, phone, email)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(payload.first_name.trim())
        .bind(payload.middle_name.as_deref().map(str::trim))
        .bind(payload.last_name.trim())
        .bind(payload.age)
        .bind(payload.phone.trim())
        .bind(payload.email.as_deref().map(str::trim))
        .execute(conn)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        payload: &TeacherPayload,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE teachers
             SET first_name = ?, middle_name = ?, last_name = ?, age = ?, phone = ?, email = ?
             WHERE id = ?",
        )
        .bind(payload.first_name.trim())
        .bind(payload.middle_name.as_deref().map(str::trim))
        .bind(payload.last_name.trim())
        .bind(payload.age)
        .bind(payload.phone.trim())
        .bind(payload.email.as_deref().map(str::trim))
        .bind(id)
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, DatabaseError> {
        delete_by_id(conn, "teachers", id).await
    }
}
