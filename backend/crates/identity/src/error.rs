//! Identity Error Types
//!
//! Identity-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Identity-specific result type alias
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Identity-specific error variants
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("User name is already taken")]
    UserNameTaken,

    #[error("Email is already registered")]
    EmailTaken,

    /// Same message for unknown email and wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    PasswordValidation(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IdentityError {
    pub fn validation(message: impl Into<String>) -> Self {
        IdentityError::Validation(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            IdentityError::UserNameTaken | IdentityError::EmailTaken => StatusCode::CONFLICT,
            IdentityError::InvalidCredentials | IdentityError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            IdentityError::Validation(_) | IdentityError::PasswordValidation(_) => {
                StatusCode::BAD_REQUEST
            }
            IdentityError::UserNotFound => StatusCode::NOT_FOUND,
            IdentityError::Database(_) | IdentityError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            IdentityError::UserNameTaken | IdentityError::EmailTaken => ErrorKind::Conflict,
            IdentityError::InvalidCredentials | IdentityError::InvalidToken => {
                ErrorKind::Unauthorized
            }
            IdentityError::Validation(_) | IdentityError::PasswordValidation(_) => {
                ErrorKind::BadRequest
            }
            IdentityError::UserNotFound => ErrorKind::NotFound,
            IdentityError::Database(_) | IdentityError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            IdentityError::Database(e) => {
                tracing::error!(error = %e, "Identity database error");
            }
            IdentityError::Internal(msg) => {
                tracing::error!(message = %msg, "Identity internal error");
            }
            IdentityError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            _ => {
                tracing::debug!(error = %self, "Identity error");
            }
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        let kind = err.kind();
        match err {
            IdentityError::Database(_) | IdentityError::Internal(_) => {
                AppError::new(kind, "Internal server error").with_source(err)
            }
            IdentityError::InvalidCredentials => AppError::new(kind, err.to_string())
                .with_action("Check your email and password and try again"),
            _ => AppError::new(kind, err.to_string()),
        }
    }
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}
