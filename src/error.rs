use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sqlx::error::ErrorKind;
use tracing::{error, warn};

use crate::response::ApiResponse;

/// Error taxonomy shared by every handler. Each variant maps to one status code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

/// Detail of a 500 response, carried in response extensions so that the
/// app layer can decide whether to expose it.
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal errors never leak their cause here.
    pub fn message(&self) -> String {
        match self {
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ApiResponse::<()>::failure(self.message());
        let mut res = (status, body).into_response();
        if let ApiError::Internal(e) = &self {
            error!(error = %format!("{:#}", e), "request failed");
            res.extensions_mut()
                .insert(InternalErrorDetail(format!("{:#}", e)));
        }
        res
    }
}

/// Maps storage constraint violations onto the taxonomy; anything else is internal.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            // string_data_right_truncation: a value longer than its VARCHAR column.
            if db_err.code().as_deref() == Some("22001") {
                warn!(detail = db_err.message(), "value too long");
                return ApiError::validation("A value is too long for its field");
            }
            let constraint = db_err.constraint().unwrap_or_default();
            match db_err.kind() {
                ErrorKind::UniqueViolation => {
                    warn!(constraint, "unique violation");
                    return if constraint == "users_email_key" {
                        ApiError::conflict("User with this email already exists")
                    } else {
                        ApiError::conflict("Resource already exists")
                    };
                }
                ErrorKind::ForeignKeyViolation => {
                    warn!(constraint, "foreign key violation");
                    return if constraint.starts_with("assignments_course_id") {
                        ApiError::not_found("Course not found")
                    } else {
                        ApiError::not_found("Referenced resource not found")
                    };
                }
                ErrorKind::CheckViolation => {
                    warn!(constraint, "check violation");
                    return if constraint.starts_with("assignments_status") {
                        ApiError::validation("Status must be either Pending or Completed")
                    } else {
                        ApiError::validation("Value violates a constraint")
                    };
                }
                ErrorKind::NotNullViolation => {
                    warn!(constraint, "not-null violation");
                    return ApiError::validation("A required field is missing");
                }
                _ => {}
            }
        }
        ApiError::Internal(err.into())
    }
}

/// Repository functions return `anyhow::Result`; recover the storage error if there is one.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<sqlx::Error>() {
            Ok(sqlx_err) => ApiError::from(sqlx_err),
            Err(other) => ApiError::Internal(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}
