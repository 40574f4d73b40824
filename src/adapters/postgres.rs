// src/adapters/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, prelude::FromRow, types::Json};

use crate::adapters::{QuestionBank, SubmissionStore};
use crate::error::{AppError, AssessmentError};
use crate::models::{
    quiz::{Question, QuestionType, Quiz},
    submission::{Submission, SubmittedAnswer},
};

/// Row of the 'quizzes' table.
#[derive(Debug, FromRow)]
struct QuizRow {
    id: i64,
    title: String,
    description: Option<String>,
    duration: String,
    passing_score: Option<i64>,
}

/// Row of the 'questions' table.
/// The 'type' column is aliased since `type` is a reserved keyword in Rust.
#[derive(Debug, FromRow)]
struct QuestionRow {
    id: i64,
    question_type: String,
    content: String,
    options: Option<Json<Vec<String>>>,
    answer: String,
    points: i64,
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let question_type = row.question_type.parse::<QuestionType>().map_err(|e: String| {
            tracing::error!("Question {} has a bad type: {}", row.id, e);
            AppError::InternalServerError(e)
        })?;

        Ok(Question {
            id: row.id,
            question_type,
            content: row.content,
            options: row.options.map(|o| o.0),
            answer: row.answer,
            points: row.points,
        })
    }
}

/// Row of the 'submissions' table.
#[derive(Debug, FromRow)]
struct SubmissionRow {
    quiz_id: i64,
    answers: Json<Vec<SubmittedAnswer>>,
    time_taken: String,
    score: i64,
    auto_submitted: bool,
    submitted_at: chrono::DateTime<chrono::Utc>,
}

impl From<SubmissionRow> for Submission {
    fn from(row: SubmissionRow) -> Self {
        Submission {
            quiz_id: row.quiz_id,
            answers: row.answers.0,
            time_taken: row.time_taken,
            score: row.score,
            auto_submitted: row.auto_submitted,
            submitted_at: row.submitted_at,
        }
    }
}

#[derive(Clone)]
pub struct PgQuestionBank {
    pool: PgPool,
}

impl PgQuestionBank {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionBank for PgQuestionBank {
    async fn get_quiz(&self, quiz_id: i64) -> Result<Quiz, AppError> {
        let quiz = sqlx::query_as::<_, QuizRow>(
            r#"
            SELECT id, title, description, duration, passing_score
            FROM quizzes
            WHERE id = $1
            "#,
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch quiz {}: {:?}", quiz_id, e);
            AppError::InternalServerError(e.to_string())
        })?
        .ok_or(AssessmentError::QuizNotFound(quiz_id))?;

        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT
                id,
                type as question_type,
                content,
                options,
                answer,
                points
            FROM questions
            WHERE quiz_id = $1
            ORDER BY position, id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch questions for quiz {}: {:?}", quiz_id, e);
            AppError::InternalServerError(e.to_string())
        })?;

        let questions = rows
            .into_iter()
            .map(Question::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Quiz {
            id: quiz.id,
            title: quiz.title,
            description: quiz.description,
            duration: quiz.duration,
            passing_score: quiz.passing_score,
            questions,
        })
    }
}

#[derive(Clone)]
pub struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn save_submission(&self, submission: &Submission) -> Result<i64, AppError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO submissions (quiz_id, answers, time_taken, score, auto_submitted, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(submission.quiz_id)
        .bind(Json(submission.answers.clone()))
        .bind(submission.time_taken.clone())
        .bind(submission.score)
        .bind(submission.auto_submitted)
        .bind(submission.submitted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save submission: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(id)
    }

    async fn get_submission(&self, submission_id: i64) -> Result<Submission, AppError> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT quiz_id, answers, time_taken, score, auto_submitted, submitted_at
            FROM submissions
            WHERE id = $1
            "#,
        )
        .bind(submission_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Submission not found".to_string()))?;

        Ok(row.into())
    }
}
