// src/engine/review.rs

use crate::engine::{grading, scoring};
use crate::error::AssessmentError;
use crate::models::quiz::Quiz;
use crate::models::submission::{ReviewReport, Submission};

/// Rebuilds the question-by-question report for a stored submission.
///
/// Verdicts are re-derived with the same scoring function used at
/// submission time. The percentage is the stored one, so edits to the
/// quiz never rewrite a historical score. Grade and verdict are derived
/// from that stored percentage and the quiz's current threshold.
pub fn assemble_review(quiz: &Quiz, submission: &Submission) -> Result<ReviewReport, AssessmentError> {
    let summary = scoring::score_answers(quiz, &submission.answers)?;
    let passing_score = quiz.passing_score();

    Ok(ReviewReport {
        quiz_id: quiz.id,
        quiz_title: quiz.title.clone(),
        answers: summary.answers,
        correct_count: summary.correct_count,
        total_questions: summary.total_questions,
        score: submission.score,
        grade: grading::letter_grade(submission.score),
        passed: grading::passed(submission.score, passing_score),
        passing_score,
        time_taken: submission.time_taken.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::grading::Grade;
    use crate::engine::test_support::{answer, sample_quiz};

    fn stored(score: i64) -> Submission {
        Submission {
            quiz_id: 7,
            answers: vec![
                answer(1, Some("Paris")),
                answer(2, Some("True")),
                answer(3, Some("powerhouse")),
                answer(4, None),
            ],
            time_taken: "3m 12s".to_string(),
            score,
            auto_submitted: false,
            submitted_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn review_reproduces_verdicts() {
        let quiz = sample_quiz();
        let report = assemble_review(&quiz, &stored(75)).unwrap();

        assert_eq!(report.correct_count, 3);
        assert_eq!(report.total_questions, 4);
        assert_eq!(report.score, 75);
        assert_eq!(report.grade, Grade::B);
        assert!(report.passed);
        assert_eq!(report.time_taken, "3m 12s");

        let unanswered = &report.answers[3];
        assert_eq!(unanswered.selected_answer, None);
        assert!(!unanswered.is_correct);
        assert_eq!(unanswered.correct_answer, "Au");
    }

    #[test]
    fn review_is_deterministic() {
        let quiz = sample_quiz();
        let submission = stored(75);
        let first = assemble_review(&quiz, &submission).unwrap();
        let second = assemble_review(&quiz, &submission).unwrap();
        assert_eq!(first.answers, second.answers);
        assert_eq!(first.correct_count, second.correct_count);
    }

    #[test]
    fn stored_score_wins_over_recomputation() {
        // The quiz changed after submission: question 1 now expects "Lyon".
        let mut quiz = sample_quiz();
        quiz.questions[0].answer = "Lyon".to_string();

        let report = assemble_review(&quiz, &stored(75)).unwrap();
        assert_eq!(report.correct_count, 2);
        assert_eq!(report.score, 75);
        assert_eq!(report.grade, Grade::B);
    }

    #[test]
    fn verdict_follows_current_threshold() {
        let mut quiz = sample_quiz();
        quiz.passing_score = Some(80);
        let report = assemble_review(&quiz, &stored(75)).unwrap();
        assert!(!report.passed);
        assert_eq!(report.passing_score, 80);
    }

    #[test]
    fn review_of_unknown_question_fails() {
        let mut quiz = sample_quiz();
        quiz.questions.retain(|q| q.id != 4);
        let err = assemble_review(&quiz, &stored(75)).unwrap_err();
        assert_eq!(err, AssessmentError::QuestionNotFound(4));
    }
}
