// src/models/submission.rs

use serde::{Deserialize, Serialize};

use crate::engine::grading::Grade;
use crate::models::quiz::QuestionType;

/// One entry of an answer snapshot: `value` is `None` when unanswered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    pub value: Option<String>,
}

/// The immutable record of a completed attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub quiz_id: i64,

    /// Answers in quiz order, one per question.
    pub answers: Vec<SubmittedAnswer>,

    /// Elapsed time, e.g. `"12m 5s"`.
    pub time_taken: String,

    /// Percentage score, 0..=100.
    pub score: i64,

    /// True when the countdown expired and forced the submission.
    pub auto_submitted: bool,

    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// Per-question correctness judgment, derived from (Quiz, Submission).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredAnswer {
    pub question_id: i64,
    pub question_text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub selected_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    pub points: i64,
}

/// Question-by-question review of a stored submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewReport {
    pub quiz_id: i64,
    pub quiz_title: String,
    pub answers: Vec<ScoredAnswer>,
    pub correct_count: usize,
    pub total_questions: usize,
    /// Taken verbatim from the stored submission.
    pub score: i64,
    pub grade: Grade,
    pub passed: bool,
    pub passing_score: i64,
    pub time_taken: String,
}

/// Returned to the client once a submission has been persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub submission_id: i64,
    pub score: i64,
    pub grade: Grade,
    pub passed: bool,
    pub time_taken: String,
    pub auto_submitted: bool,
}
