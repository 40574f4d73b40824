// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{engine::runtime::SessionManager, error::AppError, models::quiz::PublicQuiz};

/// Returns a quiz without its reference answers.
pub async fn get_quiz(
    State(sessions): State<Arc<SessionManager>>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = sessions.bank().get_quiz(quiz_id).await?;
    Ok(Json(PublicQuiz::from(&quiz)))
}
