// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

use crate::store::StoreError;

/// Domain failures of the quiz attempt operations.
///
/// Precondition variants carry a stable machine-readable reason so clients
/// can tell them apart without parsing messages.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Quiz is not currently available")]
    QuizNotActive,

    #[error("An attempt for this quiz already exists")]
    AttemptAlreadyExists,

    #[error("Attempt is completed; no further answers are accepted")]
    AttemptCompleted,

    #[error("Attempt has already been submitted")]
    AlreadyCompleted,

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl QuizError {
    pub fn reason(&self) -> &'static str {
        match self {
            QuizError::Forbidden(_) => "FORBIDDEN",
            QuizError::NotFound(_) => "NOT_FOUND",
            QuizError::QuizNotActive => "QUIZ_NOT_ACTIVE",
            QuizError::AttemptAlreadyExists => "ATTEMPT_ALREADY_EXISTS",
            QuizError::AttemptCompleted => "ATTEMPT_COMPLETED",
            QuizError::AlreadyCompleted => "ALREADY_COMPLETED",
            QuizError::Invalid(_) => "VALIDATION_ERROR",
            QuizError::Storage(_) => "INTERNAL_ERROR",
        }
    }

    pub(crate) fn not_found(entity: &str) -> Self {
        QuizError::NotFound(entity.to_string())
    }

    pub(crate) fn forbidden(msg: &str) -> Self {
        QuizError::Forbidden(msg.to_string())
    }
}

/// Store failures that no operation translated into a domain error.
impl From<StoreError> for QuizError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => QuizError::NotFound(entity.to_string()),
            StoreError::Completed => QuizError::AttemptCompleted,
            StoreError::UniqueViolation(constraint) => {
                QuizError::Storage(format!("unexpected unique violation on {}", constraint))
            }
            StoreError::Database(e) => QuizError::Storage(e.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for QuizError {
    fn from(err: validator::ValidationErrors) -> Self {
        QuizError::Invalid(err.to_string())
    }
}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 400 Bad Request with a machine-readable reason
    Precondition { reason: &'static str, message: String },

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, reason, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::Precondition { reason, message } => {
                (StatusCode::BAD_REQUEST, reason, message)
            }
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
        };
        let body = Json(json!({
            "error": error_message,
            "reason": reason,
        }));

        (status, body).into_response()
    }
}

impl From<QuizError> for AppError {
    fn from(err: QuizError) -> Self {
        let message = err.to_string();
        let reason = err.reason();
        match err {
            QuizError::Forbidden(_) => AppError::Forbidden(message),
            QuizError::NotFound(_) => AppError::NotFound(message),
            QuizError::Invalid(msg) => AppError::BadRequest(msg),
            QuizError::Storage(msg) => AppError::InternalServerError(msg),
            QuizError::QuizNotActive
            | QuizError::AttemptAlreadyExists
            | QuizError::AttemptCompleted
            | QuizError::AlreadyCompleted => AppError::Precondition { reason, message },
        }
    }
}
