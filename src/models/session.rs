// src/models/session.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::config::MAX_ANSWER_LENGTH;
use crate::models::quiz::PublicQuiz;

/// Lifecycle of a session: `not_started -> in_progress -> submitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Submitted,
}

/// DTO for starting a timed attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct StartSessionRequest {
    #[validate(range(min = 1, message = "quiz_id must be positive."))]
    pub quiz_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionStarted {
    pub session_id: Uuid,
    pub quiz: PublicQuiz,
    pub remaining_seconds: i64,
}

/// DTO for recording (or clearing, with `null`) one answer.
#[derive(Debug, Deserialize, Validate)]
pub struct AnswerRequest {
    pub question_id: i64,
    #[validate(length(max = MAX_ANSWER_LENGTH, message = "Answer is too long."))]
    pub value: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub quiz_id: i64,
    pub status: SessionStatus,
    pub remaining_seconds: i64,
    pub answered: usize,
}
