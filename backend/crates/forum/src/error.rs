//! Forum Error Types
//!
//! Forum-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Forum-specific result type alias
pub type ForumResult<T> = Result<T, ForumError>;

/// Forum-specific error variants
#[derive(Debug, Error)]
pub enum ForumError {
    #[error("Problem not found")]
    ProblemNotFound,

    #[error("Solution not found")]
    SolutionNotFound,

    #[error("User not found")]
    UserNotFound,

    /// Malformed input or an illegal field value
    #[error("{0}")]
    Validation(String),

    /// Principal is not allowed to perform the action
    #[error("{0}")]
    Forbidden(String),

    /// A conditional write lost a race or found unexpected state
    #[error("{0}")]
    PreconditionFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ForumError {
    pub fn validation(message: impl Into<String>) -> Self {
        ForumError::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ForumError::Forbidden(message.into())
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        ForumError::PreconditionFailed(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ForumError::ProblemNotFound | ForumError::SolutionNotFound | ForumError::UserNotFound => {
                StatusCode::NOT_FOUND
            }
            ForumError::Validation(_) => StatusCode::BAD_REQUEST,
            ForumError::Forbidden(_) => StatusCode::FORBIDDEN,
            ForumError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            ForumError::Database(_) | ForumError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForumError::ProblemNotFound | ForumError::SolutionNotFound | ForumError::UserNotFound => {
                ErrorKind::NotFound
            }
            ForumError::Validation(_) => ErrorKind::BadRequest,
            ForumError::Forbidden(_) => ErrorKind::Forbidden,
            ForumError::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            ForumError::Database(_) | ForumError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            ForumError::Database(e) => {
                tracing::error!(error = %e, "Forum database error");
            }
            ForumError::Internal(msg) => {
                tracing::error!(message = %msg, "Forum internal error");
            }
            ForumError::Forbidden(msg) => {
                tracing::warn!(message = %msg, "Forum action forbidden");
            }
            ForumError::PreconditionFailed(msg) => {
                tracing::warn!(message = %msg, "Forum precondition failed");
            }
            _ => {
                tracing::debug!(error = %self, "Forum error");
            }
        }
    }
}

impl From<ForumError> for AppError {
    fn from(err: ForumError) -> Self {
        let kind = err.kind();
        match err {
            // Storage details stay in the logs
            ForumError::Database(_) | ForumError::Internal(_) => {
                AppError::new(kind, "Internal server error").with_source(err)
            }
            _ => AppError::new(kind, err.to_string()),
        }
    }
}

impl IntoResponse for ForumError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}
