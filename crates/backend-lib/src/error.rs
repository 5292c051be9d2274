// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use canary_common::{ErrorBody, ErrorDetail};
use thiserror::Error;

use crate::storage::StoreError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid session")]
    InvalidSession,

    #[error("Failed to create session")]
    SessionCreationFailed,

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateUsername => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidSession => StatusCode::UNAUTHORIZED,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::SessionCreationFailed | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "VAL_001",
            AppError::DuplicateUsername => "USER_001",
            AppError::InvalidCredentials | AppError::InvalidSession => "AUTH_001",
            AppError::SessionCreationFailed => "SESS_001",
            AppError::Unavailable(_) => "STORE_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::InvalidInput(_) => "Invalid input provided".to_string(),
            AppError::DuplicateUsername => "Username already exists".to_string(),
            AppError::InvalidCredentials | AppError::InvalidSession => {
                "Authentication failed".to_string()
            },
            AppError::SessionCreationFailed => "Failed to create session".to_string(),
            AppError::Unavailable(_) => "Service temporarily unavailable".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }

    /// True for the two failures callers must not be able to tell apart
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, AppError::InvalidCredentials | AppError::InvalidSession)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Unavailable(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Blocking task failed: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Validation detail helps callers in development; everything else,
        // auth failures above all, gets the sanitized text.
        let message = match &self {
            AppError::InvalidInput(_) if cfg!(debug_assertions) => self.to_string(),
            _ => self.sanitized_message(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: error_code.to_string(),
                message,
            },
        };

        (status, axum::Json(body)).into_response()
    }
}
