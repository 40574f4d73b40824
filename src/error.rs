// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use uuid::Uuid;

/// Failures raised by the assessment engine itself.
///
/// All of them are recoverable by the caller. `AlreadySubmitted` in
/// particular means the session already reached its terminal state and
/// should be treated as a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssessmentError {
    /// Duration is not positive or not a valid `HH:MM:SS` string.
    InvalidDuration(String),

    /// The session is no longer accepting answers.
    SessionClosed,

    /// `start` was called on a session that already left `not_started`.
    AlreadyStarted,

    /// The session has already produced its one submission.
    AlreadySubmitted,

    /// An answer references a question id the quiz does not contain.
    QuestionNotFound(i64),

    /// The quiz has no questions (or no weight), so no score exists.
    EmptyQuiz,

    /// A question carries a negative weight.
    InvalidPoints(i64),

    QuizNotFound(i64),

    SessionNotFound(Uuid),
}

impl fmt::Display for AssessmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssessmentError::InvalidDuration(raw) => write!(f, "invalid duration: '{}'", raw),
            AssessmentError::SessionClosed => write!(f, "session is closed"),
            AssessmentError::AlreadyStarted => write!(f, "session has already started"),
            AssessmentError::AlreadySubmitted => write!(f, "session has already been submitted"),
            AssessmentError::QuestionNotFound(id) => write!(f, "question {} not found in quiz", id),
            AssessmentError::EmptyQuiz => write!(f, "quiz has no questions to score"),
            AssessmentError::InvalidPoints(id) => {
                write!(f, "question {} has a negative weight", id)
            }
            AssessmentError::QuizNotFound(id) => write!(f, "quiz {} not found", id),
            AssessmentError::SessionNotFound(id) => write!(f, "session {} not found", id),
        }
    }
}

impl std::error::Error for AssessmentError {}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 404 Not Found
    NotFound(String),

    // Status depends on the engine failure
    Assessment(AssessmentError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Assessment(e) => write!(f, "{}", e),
            other => write!(f, "{:?}", other),
        }
    }
}

impl std::error::Error for AppError {}

impl AssessmentError {
    fn status_code(&self) -> StatusCode {
        match self {
            AssessmentError::InvalidDuration(_)
            | AssessmentError::QuestionNotFound(_)
            | AssessmentError::EmptyQuiz
            | AssessmentError::InvalidPoints(_) => StatusCode::BAD_REQUEST,
            AssessmentError::SessionClosed
            | AssessmentError::AlreadyStarted
            | AssessmentError::AlreadySubmitted => StatusCode::CONFLICT,
            AssessmentError::QuizNotFound(_) | AssessmentError::SessionNotFound(_) => {
                StatusCode::NOT_FOUND
            }
        }
    }
}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Assessment(e) => (e.status_code(), e.to_string()),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<AssessmentError> for AppError {
    fn from(err: AssessmentError) -> Self {
        AppError::Assessment(err)
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
