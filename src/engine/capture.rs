// src/engine/capture.rs

use std::collections::HashMap;

use crate::models::{quiz::Quiz, submission::SubmittedAnswer};

/// Live answers of one session, keyed by question id.
///
/// Holds at most one value per question; later writes replace earlier ones.
/// Status checks belong to the owning `Session`.
#[derive(Debug, Clone, Default)]
pub struct AnswerCapture {
    answers: HashMap<i64, Option<String>>,
}

impl AnswerCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins. `None` clears a previous answer.
    pub fn set(&mut self, question_id: i64, value: Option<String>) {
        self.answers.insert(question_id, value);
    }

    pub fn get(&self, question_id: i64) -> Option<&str> {
        self.answers.get(&question_id).and_then(|v| v.as_deref())
    }

    /// Number of questions that currently hold a non-null answer.
    pub fn answered(&self) -> usize {
        self.answers.values().filter(|v| v.is_some()).count()
    }

    /// Copies the answers out in quiz order, one entry per question.
    /// Unanswered questions appear with a `None` value.
    pub fn snapshot(&self, quiz: &Quiz) -> Vec<SubmittedAnswer> {
        quiz.questions
            .iter()
            .map(|q| SubmittedAnswer {
                question_id: q.id,
                value: self.answers.get(&q.id).cloned().flatten(),
            })
            .collect()
    }
}
