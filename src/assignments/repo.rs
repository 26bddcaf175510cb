use serde::Serialize;
use sqlx::{Executor, FromRow, PgPool, Postgres, QueryBuilder};
use time::{Date, OffsetDateTime};

use crate::serde_util;

const ASSIGNMENT_COLUMNS: &str =
    "assignment_id, course_id, title, description, due_date, status, created_at";

/// The two states allowed by the `status` check constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum AssignmentStatus {
    #[default]
    Pending,
    Completed,
}

impl AssignmentStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Pending" => Some(AssignmentStatus::Pending),
            "Completed" => Some(AssignmentStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "Pending",
            AssignmentStatus::Completed => "Completed",
        }
    }
}

/// Column decoding; the check constraint keeps other values out of the table.
impl TryFrom<String> for AssignmentStatus {
    type Error = anyhow::Error;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        AssignmentStatus::parse(&raw).ok_or_else(|| anyhow::anyhow!("unknown status `{}`", raw))
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Assignment {
    pub assignment_id: i32,
    pub course_id: i32,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "serde_util::date")]
    pub due_date: Date,
    #[sqlx(try_from = "String")]
    pub status: AssignmentStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Assignment annotated with its parent course, as returned by the read endpoints.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AssignmentWithCourse {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub assignment: Assignment,
    pub course_name: String,
    pub course_code: String,
}

/// Assignment plus the id of the user owning its course.
#[derive(Debug, Clone, FromRow)]
pub struct OwnedAssignment {
    #[sqlx(flatten)]
    pub assignment: AssignmentWithCourse,
    pub user_id: i32,
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub course_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Date,
    pub status: AssignmentStatus,
}

/// Sparse update: `None` leaves the column untouched, `Some(None)` on
/// `description` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Date>,
    pub status: Option<AssignmentStatus>,
}

impl AssignmentPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
    }
}

pub async fn list_for_user(db: &PgPool, user_id: i32) -> anyhow::Result<Vec<AssignmentWithCourse>> {
    let rows = sqlx::query_as::<_, AssignmentWithCourse>(
        r#"
        SELECT a.assignment_id, a.course_id, a.title, a.description, a.due_date, a.status,
               a.created_at, c.course_name, c.course_code
        FROM assignments a
        JOIN courses c ON a.course_id = c.course_id
        WHERE c.user_id = $1
        ORDER BY a.due_date ASC, a.assignment_id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_for_course<'e, E>(ex: E, course_id: i32) -> anyhow::Result<Vec<AssignmentWithCourse>>
where
    E: Executor<'e, Database = Postgres>,
{
    let rows = sqlx::query_as::<_, AssignmentWithCourse>(
        r#"
        SELECT a.assignment_id, a.course_id, a.title, a.description, a.due_date, a.status,
               a.created_at, c.course_name, c.course_code
        FROM assignments a
        JOIN courses c ON a.course_id = c.course_id
        WHERE a.course_id = $1
        ORDER BY a.due_date ASC, a.assignment_id ASC
        "#,
    )
    .bind(course_id)
    .fetch_all(ex)
    .await?;
    Ok(rows)
}

/// True when `course_id` belongs to `user_id`. The row is key-share locked
/// until the surrounding transaction ends, so it cannot be deleted under us.
pub async fn lock_owned_course<'e, E>(ex: E, user_id: i32, course_id: i32) -> anyhow::Result<bool>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT course_id
        FROM courses
        WHERE course_id = $1 AND user_id = $2
        FOR KEY SHARE
        "#,
    )
    .bind(course_id)
    .bind(user_id)
    .fetch_optional(ex)
    .await?;
    Ok(row.is_some())
}

/// Looks an assignment up regardless of owner; callers compare `user_id`.
/// With `for_update` the assignment row stays locked until commit.
pub async fn find_with_owner<'e, E>(
    ex: E,
    assignment_id: i32,
    for_update: bool,
) -> anyhow::Result<Option<OwnedAssignment>>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut sql = String::from(
        r#"
        SELECT a.assignment_id, a.course_id, a.title, a.description, a.due_date, a.status,
               a.created_at, c.course_name, c.course_code, c.user_id
        FROM assignments a
        JOIN courses c ON a.course_id = c.course_id
        WHERE a.assignment_id = $1
        "#,
    );
    if for_update {
        sql.push_str(" FOR UPDATE OF a");
    }
    let row = sqlx::query_as::<_, OwnedAssignment>(&sql)
        .bind(assignment_id)
        .fetch_optional(ex)
        .await?;
    Ok(row)
}

pub async fn insert<'e, E>(ex: E, new: NewAssignment) -> anyhow::Result<Assignment>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query_as::<_, Assignment>(
        r#"
        INSERT INTO assignments (course_id, title, description, due_date, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING assignment_id, course_id, title, description, due_date, status, created_at
        "#,
    )
    .bind(new.course_id)
    .bind(new.title)
    .bind(new.description)
    .bind(new.due_date)
    .bind(new.status.as_str())
    .fetch_one(ex)
    .await?;
    Ok(row)
}

/// Builds `UPDATE assignments SET ...` for the supplied columns only, in
/// fixed column order. Returns `None` for an empty patch.
pub(crate) fn update_query(
    assignment_id: i32,
    patch: &AssignmentPatch,
) -> Option<QueryBuilder<'static, Postgres>> {
    if patch.is_empty() {
        return None;
    }

    let mut qb = QueryBuilder::new("UPDATE assignments SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(title) = &patch.title {
            set.push("title = ").push_bind_unseparated(title.clone());
        }
        if let Some(description) = &patch.description {
            set.push("description = ")
                .push_bind_unseparated(description.clone());
        }
        if let Some(due_date) = patch.due_date {
            set.push("due_date = ").push_bind_unseparated(due_date);
        }
        if let Some(status) = patch.status {
            set.push("status = ").push_bind_unseparated(status.as_str());
        }
    }
    qb.push(" WHERE assignment_id = ")
        .push_bind(assignment_id)
        .push(" RETURNING ")
        .push(ASSIGNMENT_COLUMNS);
    Some(qb)
}

pub async fn update<'e, E>(
    ex: E,
    assignment_id: i32,
    patch: &AssignmentPatch,
) -> anyhow::Result<Option<Assignment>>
where
    E: Executor<'e, Database = Postgres>,
{
    let Some(mut qb) = update_query(assignment_id, patch) else {
        anyhow::bail!("empty assignment patch");
    };
    let row = qb.build_query_as::<Assignment>().fetch_optional(ex).await?;
    Ok(row)
}

pub async fn delete<'e, E>(ex: E, assignment_id: i32) -> anyhow::Result<Option<Assignment>>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query_as::<_, Assignment>(
        r#"
        DELETE FROM assignments
        WHERE assignment_id = $1
        RETURNING assignment_id, course_id, title, description, due_date, status, created_at
        "#,
    )
    .bind(assignment_id)
    .fetch_optional(ex)
    .await?;
    Ok(row)
}
