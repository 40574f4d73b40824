// src/adapters/memory.rs

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::adapters::{QuestionBank, SubmissionStore};
use crate::error::{AppError, AssessmentError};
use crate::models::{quiz::Quiz, submission::Submission};

fn poisoned<T>(_: T) -> AppError {
    AppError::InternalServerError("in-memory store lock poisoned".to_string())
}

/// Question bank backed by a map. Useful for tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryQuestionBank {
    quizzes: RwLock<HashMap<i64, Quiz>>,
}

impl InMemoryQuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quizzes(quizzes: impl IntoIterator<Item = Quiz>) -> Self {
        let bank = Self::new();
        for quiz in quizzes {
            bank.insert(quiz);
        }
        bank
    }

    /// Adds or replaces a quiz.
    pub fn insert(&self, quiz: Quiz) {
        if let Ok(mut quizzes) = self.quizzes.write() {
            quizzes.insert(quiz.id, quiz);
        }
    }
}

#[async_trait]
impl QuestionBank for InMemoryQuestionBank {
    async fn get_quiz(&self, quiz_id: i64) -> Result<Quiz, AppError> {
        self.quizzes
            .read()
            .map_err(poisoned)?
            .get(&quiz_id)
            .cloned()
            .ok_or_else(|| AssessmentError::QuizNotFound(quiz_id).into())
    }
}

/// Append-only submission store; ids start at 1.
#[derive(Debug, Default)]
pub struct InMemorySubmissionStore {
    submissions: RwLock<Vec<Submission>>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.submissions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn all(&self) -> Vec<Submission> {
        self.submissions.read().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn save_submission(&self, submission: &Submission) -> Result<i64, AppError> {
        let mut submissions = self.submissions.write().map_err(poisoned)?;
        submissions.push(submission.clone());
        Ok(submissions.len() as i64)
    }

    async fn get_submission(&self, submission_id: i64) -> Result<Submission, AppError> {
        let submissions = self.submissions.read().map_err(poisoned)?;
        usize::try_from(submission_id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|idx| submissions.get(idx))
            .cloned()
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))
    }
}
