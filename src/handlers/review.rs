// src/handlers/review.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{engine::review::assemble_review, engine::runtime::SessionManager, error::AppError};

/// Question-by-question review of a stored submission.
///
/// Loads the submission and its quiz, then re-scores every answer.
/// The percentage shown is the one stored at submission time.
pub async fn get_review(
    State(sessions): State<Arc<SessionManager>>,
    Path(submission_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let submission = sessions.store().get_submission(submission_id).await?;
    let quiz = sessions.bank().get_quiz(submission.quiz_id).await?;

    let report = assemble_review(&quiz, &submission).map_err(|e| {
        tracing::error!("Failed to rebuild review for submission {}: {}", submission_id, e);
        AppError::from(e)
    })?;

    Ok(Json(report))
}
