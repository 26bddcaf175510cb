use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

const COURSE_COLUMNS: &str = "course_id, user_id, course_name, course_code, semester, created_at";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Course {
    pub course_id: i32,
    pub user_id: i32,
    pub course_name: String,
    pub course_code: String,
    pub semester: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub course_name: String,
    pub course_code: String,
    pub semester: Option<String>,
}

/// Sparse update: `None` leaves the column untouched, `Some(None)` on
/// `semester` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoursePatch {
    pub course_name: Option<String>,
    pub course_code: Option<String>,
    pub semester: Option<Option<String>>,
}

impl CoursePatch {
    pub fn is_empty(&self) -> bool {
        self.course_name.is_none() && self.course_code.is_none() && self.semester.is_none()
    }
}

pub async fn list_by_user(db: &PgPool, user_id: i32) -> anyhow::Result<Vec<Course>> {
    let rows = sqlx::query_as::<_, Course>(
        r#"
        SELECT course_id, user_id, course_name, course_code, semester, created_at
        FROM courses
        WHERE user_id = $1
        ORDER BY created_at DESC, course_id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Ownership is part of the lookup: another user's course is simply absent.
pub async fn find_owned(db: &PgPool, user_id: i32, course_id: i32) -> anyhow::Result<Option<Course>> {
    let row = sqlx::query_as::<_, Course>(
        r#"
        SELECT course_id, user_id, course_name, course_code, semester, created_at
        FROM courses
        WHERE course_id = $1 AND user_id = $2
        "#,
    )
    .bind(course_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn create(db: &PgPool, user_id: i32, course: NewCourse) -> anyhow::Result<Course> {
    let row = sqlx::query_as::<_, Course>(
        r#"
        INSERT INTO courses (user_id, course_name, course_code, semester)
        VALUES ($1, $2, $3, $4)
        RETURNING course_id, user_id, course_name, course_code, semester, created_at
        "#,
    )
    .bind(user_id)
    .bind(course.course_name)
    .bind(course.course_code)
    .bind(course.semester)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Builds `UPDATE courses SET ...` for the supplied columns only, in fixed
/// column order. Returns `None` for an empty patch.
pub(crate) fn update_query(
    user_id: i32,
    course_id: i32,
    patch: &CoursePatch,
) -> Option<QueryBuilder<'static, Postgres>> {
    if patch.is_empty() {
        return None;
    }

    let mut qb = QueryBuilder::new("UPDATE courses SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(name) = &patch.course_name {
            set.push("course_name = ").push_bind_unseparated(name.clone());
        }
        if let Some(code) = &patch.course_code {
            set.push("course_code = ").push_bind_unseparated(code.clone());
        }
        if let Some(semester) = &patch.semester {
            set.push("semester = ").push_bind_unseparated(semester.clone());
        }
    }
    qb.push(" WHERE course_id = ")
        .push_bind(course_id)
        .push(" AND user_id = ")
        .push_bind(user_id)
        .push(" RETURNING ")
        .push(COURSE_COLUMNS);
    Some(qb)
}

/// Single statement, so the ownership check and the write cannot interleave.
pub async fn update_owned(
    db: &PgPool,
    user_id: i32,
    course_id: i32,
    patch: &CoursePatch,
) -> anyhow::Result<Option<Course>> {
    let Some(mut qb) = update_query(user_id, course_id, patch) else {
        anyhow::bail!("empty course patch");
    };
    let row = qb.build_query_as::<Course>().fetch_optional(db).await?;
    Ok(row)
}

/// Assignments go with the course through `ON DELETE CASCADE`.
pub async fn delete_owned(db: &PgPool, user_id: i32, course_id: i32) -> anyhow::Result<Option<Course>> {
    let row = sqlx::query_as::<_, Course>(
        r#"
        DELETE FROM courses
        WHERE course_id = $1 AND user_id = $2
        RETURNING course_id, user_id, course_name, course_code, semester, created_at
        "#,
    )
    .bind(course_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}
