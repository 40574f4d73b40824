// src/models/quiz.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PASSING_SCORE;

/// Kind of answer a question expects.
///
/// Choice types compare labels exactly, text types compare loosely
/// (see `engine::scoring`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    #[serde(rename = "MCQ")]
    Mcq,
    TrueFalse,
    ShortAnswer,
    FillBlank,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Mcq => "MCQ",
            QuestionType::TrueFalse => "TRUE_FALSE",
            QuestionType::ShortAnswer => "SHORT_ANSWER",
            QuestionType::FillBlank => "FILL_BLANK",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MCQ" => Ok(QuestionType::Mcq),
            "TRUE_FALSE" => Ok(QuestionType::TrueFalse),
            "SHORT_ANSWER" => Ok(QuestionType::ShortAnswer),
            "FILL_BLANK" => Ok(QuestionType::FillBlank),
            other => Err(format!("unknown question type '{}'", other)),
        }
    }
}

fn default_points() -> i64 {
    1
}

/// One question of a quiz, including its reference answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    #[serde(rename = "type")]
    pub question_type: QuestionType,

    /// The prompt shown to the test-taker.
    pub content: String,

    /// Option labels, present only for choice questions.
    #[serde(default)]
    pub options: Option<Vec<String>>,

    /// Reference answer: an option label for choice types, free text otherwise.
    pub answer: String,

    /// Weight of the question in the aggregate score.
    #[serde(default = "default_points")]
    pub points: i64,
}

/// A quiz as handed out by the question bank. Read-only once a session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,

    /// Allotted time as `HH:MM:SS`.
    pub duration: String,

    /// Passing threshold in percent; `DEFAULT_PASSING_SCORE` when unset.
    pub passing_score: Option<i64>,

    /// Questions in presentation order.
    pub questions: Vec<Question>,
}

impl Quiz {
    pub fn passing_score(&self) -> i64 {
        self.passing_score.unwrap_or(DEFAULT_PASSING_SCORE)
    }

    pub fn question(&self, id: i64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn contains_question(&self, id: i64) -> bool {
        self.question(id).is_some()
    }
}

/// DTO for sending a question to the client (excludes the reference answer).
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: i64,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub content: String,
    pub options: Option<Vec<String>>,
    pub points: i64,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            question_type: q.question_type,
            content: q.content.clone(),
            options: q.options.clone(),
            points: q.points,
        }
    }
}

/// DTO for sending a whole quiz to the client.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicQuiz {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub duration: String,
    pub passing_score: i64,
    pub questions: Vec<PublicQuestion>,
}

impl From<&Quiz> for PublicQuiz {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            duration: quiz.duration.clone(),
            passing_score: quiz.passing_score(),
            questions: quiz.questions.iter().map(PublicQuestion::from).collect(),
        }
    }
}
