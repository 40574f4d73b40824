// src/engine/scoring.rs

//! Correctness and percentage scoring.
//!
//! Both the submission path and the review path call into this module, so
//! a stored submission always re-scores to the same verdicts.

use std::collections::HashMap;

use crate::error::AssessmentError;
use crate::models::quiz::{Question, QuestionType, Quiz};
use crate::models::submission::{ScoredAnswer, SubmittedAnswer};

/// Verdict for a single question. All or nothing.
///
/// * Choice questions: exact, case-sensitive label match.
/// * Text questions: match after trimming and lowercasing both sides.
/// * No answer is always wrong.
pub fn is_correct(question: &Question, submitted: Option<&str>) -> bool {
    let Some(submitted) = submitted else {
        return false;
    };

    match question.question_type {
        QuestionType::Mcq | QuestionType::TrueFalse => submitted == question.answer,
        QuestionType::ShortAnswer | QuestionType::FillBlank => {
            normalize_text(submitted) == normalize_text(&question.answer)
        }
    }
}

fn normalize_text(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Integer percentage, rounded to nearest with halves going up.
pub fn percentage(earned: i64, total: i64) -> Result<i64, AssessmentError> {
    if total <= 0 {
        return Err(AssessmentError::EmptyQuiz);
    }
    // floor((200 * earned + total) / (2 * total)) == round_half_up(100 * earned / total)
    Ok((200 * earned + total) / (2 * total))
}

/// Sum of question weights. A negative weight is rejected.
pub fn total_points(quiz: &Quiz) -> Result<i64, AssessmentError> {
    quiz.questions.iter().try_fold(0, |sum, q| {
        if q.points < 0 {
            Err(AssessmentError::InvalidPoints(q.id))
        } else {
            Ok(sum + q.points)
        }
    })
}

/// Result of scoring one answer set against a quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSummary {
    pub answers: Vec<ScoredAnswer>,
    pub correct_count: usize,
    pub total_questions: usize,
    pub earned_points: i64,
    pub total_points: i64,
    pub score: i64,
}

/// Scores `submitted` against every question of `quiz`.
///
/// Questions without an entry count as unanswered, so the denominator is
/// always the whole quiz. Entries for unknown question ids are rejected.
pub fn score_answers(
    quiz: &Quiz,
    submitted: &[SubmittedAnswer],
) -> Result<ScoreSummary, AssessmentError> {
    if quiz.questions.is_empty() {
        return Err(AssessmentError::EmptyQuiz);
    }
    let total_points = total_points(quiz)?;

    let mut by_question: HashMap<i64, Option<&str>> = HashMap::with_capacity(submitted.len());
    for entry in submitted {
        if !quiz.contains_question(entry.question_id) {
            return Err(AssessmentError::QuestionNotFound(entry.question_id));
        }
        by_question.insert(entry.question_id, entry.value.as_deref());
    }

    let mut answers = Vec::with_capacity(quiz.questions.len());
    let mut correct_count = 0;
    let mut earned_points = 0;

    for question in &quiz.questions {
        let selected = by_question.get(&question.id).copied().flatten();
        let correct = is_correct(question, selected);

        if correct {
            correct_count += 1;
            earned_points += question.points;
        }

        answers.push(ScoredAnswer {
            question_id: question.id,
            question_text: question.content.clone(),
            question_type: question.question_type,
            selected_answer: selected.map(str::to_string),
            correct_answer: question.answer.clone(),
            is_correct: correct,
            points: question.points,
        });
    }

    let score = percentage(earned_points, total_points)?;

    Ok(ScoreSummary {
        answers,
        correct_count,
        total_questions: quiz.questions.len(),
        earned_points,
        total_points,
        score,
    })
}
