use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use validator::Validate;

use crate::database::manager::DatabaseError;
use crate::database::repository::{delete_by_id, Labels, Repository};
use crate::filter::{FilterOrder, ListQuery, SortField};
use crate::validation::short_text;

const SELECT_CARDS: &str = "SELECT c.id, c.number, c.student_id, s.first_name, s.last_name \
     FROM student_cards c JOIN students s ON s.id = c.student_id";

#[derive(Debug, Clone, FromRow)]
pub struct StudentCardRow {
    pub id: i64,
    pub number: String,
    pub student_id: i64,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentCardView {
    pub id: i64,
    pub number: String,
    pub student_id: i64,
    pub student: String,
}

impl From<StudentCardRow> for StudentCardView {
    fn from(row: StudentCardRow) -> Self {
        Self {
            id: row.id,
            number: row.number,
            student_id: row.student_id,
            student: format!("{} {}", row.first_name, row.last_name),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StudentCardPayload {
    #[validate(range(min = 1, message = "Некорректный идентификатор студента"))]
    pub student_id: i64,
    #[validate(custom(function = "short_text"))]
    pub number: String,
}

pub struct StudentCards;

impl StudentCards {
    async fn ensure_student(
        conn: &mut SqliteConnection,
        student_id: i64,
    ) -> Result<(), DatabaseError> {
        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM students WHERE id = ?")
            .bind(student_id)
            .fetch_optional(conn)
            .await?;
        found
            .map(|_| ())
            .ok_or_else(|| DatabaseError::NotFound("Студент не найден".to_string()))
    }

    // Two unique columns; tell them apart for the client.
    async fn ensure_free(
        conn: &mut SqliteConnection,
        payload: &StudentCardPayload,
        except_id: Option<i64>,
    ) -> Result<(), DatabaseError> {
        let except_id = except_id.unwrap_or(0);

        let student_taken = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM student_cards WHERE student_id = ? AND id != ?",
        )
        .bind(payload.student_id)
        .bind(except_id)
        .fetch_optional(&mut *conn)
        .await?;
        if student_taken.is_some() {
            return Err(DatabaseError::Conflict(
                "У студента уже есть студенческий билет".to_string(),
            ));
        }

        let number_taken = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM student_cards WHERE number = ? AND id != ?",
        )
        .bind(payload.number.trim())
        .bind(except_id)
        .fetch_optional(conn)
        .await?;
        if number_taken.is_some() {
            return Err(DatabaseError::Conflict(
                "Студенческий билет с таким номером уже существует".to_string(),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl Repository for StudentCards {
    type Payload = StudentCardPayload;
    type View = StudentCardView;

    const LABELS: Labels = Labels {
        collection: "cards",
        not_found: "Студенческий билет не найден",
        deleted: "Студенческий билет успешно удален",
    };
    const SORT_FIELDS: &'static [SortField] = &[SortField::new("number", "c.number")];
    const FILTERABLE: bool = false;

    async fn find(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<StudentCardView>, DatabaseError> {
        let row = sqlx::query_as::<_, StudentCardRow>(&format!("{} WHERE c.id = ?", SELECT_CARDS))
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row.map(StudentCardView::from))
    }

    async fn list(
        conn: &mut SqliteConnection,
        query: &ListQuery,
    ) -> Result<Vec<StudentCardView>, DatabaseError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_CARDS);
        builder.push(FilterOrder::generate(query.order.as_ref(), "c.id"));
        let rows = builder.build_query_as::<StudentCardRow>().fetch_all(conn).await?;
        Ok(rows.into_iter().map(StudentCardView::from).collect())
    }

    async fn insert(
        conn: &mut SqliteConnection,
        payload: &StudentCardPayload,
    ) -> Result<i64, DatabaseError> {
        Self::ensure_student(&mut *conn, payload.student_id).await?;
        Self::ensure_free(&mut *conn, payload, None).await?;

        let result = sqlx::query("INSERT INTO student_cards (student_id, number) VALUES (?, ?)")
            .bind(payload.student_id)
            .bind(payload.number.trim())
            .execute(conn)
            .await?;
        Ok(result.last_insert_rowid())
    }

    async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        payload: &StudentCardPayload,
    ) -> Result<(), DatabaseError> {
        Self::ensure_student(&mut *conn, payload.student_id).await?;
        Self::ensure_free(&mut *conn, payload, Some(id)).await?;

        sqlx::query("UPDATE student_cards SET student_id = ?, number = ? WHERE id = ?")
            .bind(payload.student_id)
            .bind(payload.number.trim())
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, DatabaseError> {
        delete_by_id(conn, "student_cards", id).await
    }
}
