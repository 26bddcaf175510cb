use anyhow::Context;
use time::{macros::date, Date};
use tracing::info;

use studyplanner::{
    assignments::repo::{self as assignment_repo, AssignmentStatus, NewAssignment},
    auth::{password::hash_password, repo::User},
    courses::repo::{self as course_repo, NewCourse},
    logging,
    state::AppState,
};

const SAMPLE_PASSWORD: &str = "password123";

/// Inserts the demo data set. Users that already exist are left alone together
/// with their courses.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let state = AppState::init().await?;
    sqlx::migrate!("./migrations")
        .run(&state.db)
        .await
        .context("run migrations")?;

    let users = [
        ("Shubhreet Kaur", "shubhreet@example.com"),
        ("Test Student", "test@example.com"),
    ];
    let mut user_ids = Vec::with_capacity(users.len());
    for (name, email) in users {
        if User::find_by_email(&state.db, email).await?.is_some() {
            info!(email, "sample user exists; skipping");
            user_ids.push(None);
            continue;
        }
        let hash = hash_password(SAMPLE_PASSWORD)?;
        let user = User::create(&state.db, name, email, &hash).await?;
        info!(user_id = user.user_id, email, "sample user created");
        user_ids.push(Some(user.user_id));
    }

    let courses: [(usize, &str, &str); 4] = [
        (0, "Full Stack Development", "PROG2500"),
        (0, "Database Management", "PROG1400"),
        (0, "Web Programming", "PROG1700"),
        (1, "Mobile Development", "PROG3000"),
    ];
    let mut course_ids = Vec::with_capacity(courses.len());
    for (owner, name, code) in courses {
        let Some(user_id) = user_ids[owner] else {
            course_ids.push(None);
            continue;
        };
        let course = course_repo::create(
            &state.db,
            user_id,
            NewCourse {
                course_name: name.into(),
                course_code: code.into(),
                semester: Some("Winter 2026".into()),
            },
        )
        .await?;
        course_ids.push(Some(course.course_id));
    }

    let assignments: [(usize, &str, &str, Date, AssignmentStatus); 7] = [
        (0, "Sprint 1 - Backend API", "Build REST API with PostgreSQL", date!(2026 - 02 - 15), AssignmentStatus::Pending),
        (0, "Sprint 2 - Frontend", "Create React frontend", date!(2026 - 03 - 01), AssignmentStatus::Pending),
        (1, "Database Design Project", "Design normalized database schema", date!(2026 - 02 - 20), AssignmentStatus::Pending),
        (1, "SQL Queries Assignment", "Write complex SQL queries", date!(2026 - 02 - 12), AssignmentStatus::Completed),
        (2, "HTML/CSS Portfolio", "Build personal portfolio website", date!(2026 - 02 - 18), AssignmentStatus::Completed),
        (2, "JavaScript Mini-Project", "Interactive web application", date!(2026 - 02 - 25), AssignmentStatus::Pending),
        (3, "Android App Development", "Build native Android app", date!(2026 - 03 - 05), AssignmentStatus::Pending),
    ];
    let mut inserted = 0;
    for (course, title, description, due_date, status) in assignments {
        let Some(course_id) = course_ids[course] else {
            continue;
        };
        assignment_repo::insert(
            &state.db,
            NewAssignment {
                course_id,
                title: title.into(),
                description: Some(description.into()),
                due_date,
                status,
            },
        )
        .await?;
        inserted += 1;
    }

    info!(
        users = user_ids.iter().flatten().count(),
        courses = course_ids.iter().flatten().count(),
        assignments = inserted,
        "seed complete"
    );
    Ok(())
}
