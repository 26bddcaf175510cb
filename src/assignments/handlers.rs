use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{CreateAssignmentRequest, UpdateAssignmentRequest},
    repo::{self, Assignment, AssignmentWithCourse, OwnedAssignment},
};
use crate::{
    auth::AuthUser,
    error::ApiError,
    extract::{ApiJson, ApiPath},
    response::ApiResponse,
    state::AppState,
};

pub fn assignment_routes() -> Router<AppState> {
    Router::new()
        .route("/courses/:id/assignments", get(list_course_assignments))
        .route("/assignments", get(list_assignments).post(create_assignment))
        .route(
            "/assignments/:id",
            get(get_assignment)
                .put(update_assignment)
                .delete(delete_assignment),
        )
}

/// Missing is 404; present but under someone else's course is 403.
fn check_owner(
    found: Option<OwnedAssignment>,
    user_id: i32,
    action: &str,
) -> Result<AssignmentWithCourse, ApiError> {
    let owned = found.ok_or_else(|| ApiError::not_found("Assignment not found"))?;
    if owned.user_id != user_id {
        warn!(
            user_id,
            owner_id = owned.user_id,
            assignment_id = owned.assignment.assignment.assignment_id,
            "assignment access denied"
        );
        return Err(ApiError::forbidden(format!(
            "Not authorized to {} this assignment",
            action
        )));
    }
    Ok(owned.assignment)
}

#[instrument(skip(state))]
pub async fn list_course_assignments(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(course_id): ApiPath<i32>,
) -> Result<ApiResponse<Vec<AssignmentWithCourse>>, ApiError> {
    let mut tx = state.db.begin().await?;
    if !repo::lock_owned_course(&mut *tx, user_id, course_id).await? {
        return Err(ApiError::not_found("Course not found"));
    }
    let rows = repo::list_for_course(&mut *tx, course_id).await?;
    tx.commit().await?;
    Ok(ApiResponse::list(rows))
}

#[instrument(skip(state))]
pub async fn list_assignments(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<ApiResponse<Vec<AssignmentWithCourse>>, ApiError> {
    let rows = repo::list_for_user(&state.db, user_id).await?;
    Ok(ApiResponse::list(rows))
}

#[instrument(skip(state))]
pub async fn get_assignment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(assignment_id): ApiPath<i32>,
) -> Result<ApiResponse<AssignmentWithCourse>, ApiError> {
    let found = repo::find_with_owner(&state.db, assignment_id, false).await?;
    let assignment = check_owner(found, user_id, "access")?;
    Ok(ApiResponse::ok(assignment))
}

#[instrument(skip(state, body))]
pub async fn create_assignment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<CreateAssignmentRequest>,
) -> Result<(StatusCode, ApiResponse<Assignment>), ApiError> {
    let draft = body.validate()?;

    let mut tx = state.db.begin().await?;
    if !repo::lock_owned_course(&mut *tx, user_id, draft.course_id).await? {
        return Err(ApiError::not_found("Course not found"));
    }
    let new = draft.into_new()?;
    let assignment = repo::insert(&mut *tx, new).await?;
    tx.commit().await?;

    info!(
        user_id,
        course_id = assignment.course_id,
        assignment_id = assignment.assignment_id,
        "assignment created"
    );
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Assignment created successfully", assignment),
    ))
}

#[instrument(skip(state, body))]
pub async fn update_assignment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(assignment_id): ApiPath<i32>,
    ApiJson(body): ApiJson<UpdateAssignmentRequest>,
) -> Result<ApiResponse<Assignment>, ApiError> {
    let draft = body.into_patch()?;

    let mut tx = state.db.begin().await?;
    let found = repo::find_with_owner(&mut *tx, assignment_id, true).await?;
    check_owner(found, user_id, "update")?;
    let patch = draft.into_patch()?;
    let assignment = repo::update(&mut *tx, assignment_id, &patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Assignment not found"))?;
    tx.commit().await?;

    info!(user_id, assignment_id, "assignment updated");
    Ok(ApiResponse::with_message(
        "Assignment updated successfully",
        assignment,
    ))
}

#[instrument(skip(state))]
pub async fn delete_assignment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(assignment_id): ApiPath<i32>,
) -> Result<ApiResponse<Assignment>, ApiError> {
    let mut tx = state.db.begin().await?;
    let found = repo::find_with_owner(&mut *tx, assignment_id, true).await?;
    check_owner(found, user_id, "delete")?;
    let assignment = repo::delete(&mut *tx, assignment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Assignment not found"))?;
    tx.commit().await?;

    info!(user_id, assignment_id, "assignment deleted");
    Ok(ApiResponse::with_message(
        "Assignment deleted successfully",
        assignment,
    ))
}
