// src/handlers/session.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    engine::runtime::{SessionManager, SubmitOutcome},
    error::AppError,
    models::session::{AnswerRequest, StartSessionRequest},
};

/// Starts a timed attempt.
///
/// Loads the quiz from the question bank and starts its countdown.
/// Returns 201 Created with the session id and the quiz without answers.
pub async fn start_session(
    State(sessions): State<Arc<SessionManager>>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let started = sessions.start_session(payload.quiz_id).await?;

    Ok((StatusCode::CREATED, Json(started)))
}

/// Current status and remaining time of a session.
pub async fn get_session(
    State(sessions): State<Arc<SessionManager>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = sessions.view(session_id).await?;
    Ok(Json(view))
}

/// Records one answer. Sending `null` clears it.
pub async fn set_answer(
    State(sessions): State<Arc<SessionManager>>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    sessions
        .set_answer(session_id, payload.question_id, payload.value)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Submits a session and returns its score.
///
/// A session that was already submitted (for instance by its timer) is
/// not an error: the response says so with 200 OK.
pub async fn submit_session(
    State(sessions): State<Arc<SessionManager>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let body = match sessions.submit(session_id).await? {
        SubmitOutcome::Submitted(receipt) => json!({
            "status": "submitted",
            "submission_id": receipt.submission_id,
            "score": receipt.score,
            "grade": receipt.grade,
            "passed": receipt.passed,
            "time_taken": receipt.time_taken,
            "auto_submitted": receipt.auto_submitted,
        }),
        SubmitOutcome::AlreadySubmitted { submission_id } => json!({
            "status": "already_submitted",
            "submission_id": submission_id,
        }),
    };

    Ok(Json(body))
}

/// Abandons a session without saving anything.
pub async fn discard_session(
    State(sessions): State<Arc<SessionManager>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    sessions.discard(session_id)?;
    Ok(StatusCode::NO_CONTENT)
}
