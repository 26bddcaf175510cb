use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CreateCourseRequest, UpdateCourseRequest},
    repo::{self, Course},
};
use crate::{
    auth::AuthUser,
    error::ApiError,
    extract::{ApiJson, ApiPath},
    response::ApiResponse,
    state::AppState,
};

pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/:id",
            get(get_course).put(update_course).delete(delete_course),
        )
}

fn course_not_found() -> ApiError {
    ApiError::not_found("Course not found")
}

#[instrument(skip(state))]
pub async fn list_courses(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<ApiResponse<Vec<Course>>, ApiError> {
    let courses = repo::list_by_user(&state.db, user_id).await?;
    Ok(ApiResponse::list(courses))
}

#[instrument(skip(state))]
pub async fn get_course(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(course_id): ApiPath<i32>,
) -> Result<ApiResponse<Course>, ApiError> {
    let course = repo::find_owned(&state.db, user_id, course_id)
        .await?
        .ok_or_else(course_not_found)?;
    Ok(ApiResponse::ok(course))
}

#[instrument(skip(state, body))]
pub async fn create_course(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<CreateCourseRequest>,
) -> Result<(StatusCode, ApiResponse<Course>), ApiError> {
    let new_course = body.validate()?;
    let course = repo::create(&state.db, user_id, new_course).await?;
    info!(user_id, course_id = course.course_id, "course created");
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Course created successfully", course),
    ))
}

#[instrument(skip(state, body))]
pub async fn update_course(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(course_id): ApiPath<i32>,
    ApiJson(body): ApiJson<UpdateCourseRequest>,
) -> Result<ApiResponse<Course>, ApiError> {
    let patch = body.into_patch()?;
    let course = repo::update_owned(&state.db, user_id, course_id, &patch)
        .await?
        .ok_or_else(course_not_found)?;
    info!(user_id, course_id, "course updated");
    Ok(ApiResponse::with_message("Course updated successfully", course))
}

#[instrument(skip(state))]
pub async fn delete_course(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(course_id): ApiPath<i32>,
) -> Result<ApiResponse<Course>, ApiError> {
    let course = repo::delete_owned(&state.db, user_id, course_id)
        .await?
        .ok_or_else(course_not_found)?;
    info!(user_id, course_id, "course deleted");
    Ok(ApiResponse::with_message("Course deleted successfully", course))
}
