// src/adapters/mod.rs

//! Collaborators the engine consumes but does not own: where quizzes come
//! from, where submissions go, and who hears about outcomes.

pub mod memory;
pub mod notify;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{quiz::Quiz, submission::Submission};

/// Source of quizzes. Fails with `AssessmentError::QuizNotFound` for unknown ids.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    async fn get_quiz(&self, quiz_id: i64) -> Result<Quiz, AppError>;
}

/// Durable home of submissions.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn save_submission(&self, submission: &Submission) -> Result<i64, AppError>;

    async fn get_submission(&self, submission_id: i64) -> Result<Submission, AppError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Submitted {
        session_id: Uuid,
        submission_id: i64,
        score: i64,
        passed: bool,
        auto_submitted: bool,
    },
    Failed {
        session_id: Option<Uuid>,
        reason: String,
    },
}

/// Fire-and-forget outlet for outcomes. Delivery is best effort.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}
