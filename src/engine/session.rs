// src/engine/session.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::engine::{assembler, scoring};
use crate::engine::capture::AnswerCapture;
use crate::engine::clock::{ClockEvent, CountdownClock, parse_duration};
use crate::error::AssessmentError;
use crate::models::quiz::Quiz;
use crate::models::session::SessionStatus;
use crate::models::submission::{Submission, SubmittedAnswer};

/// One test-taker's attempt at one quiz.
///
/// Owns the countdown and the live answers. Every mutation goes through
/// `start`, `set_answer`, `tick` or `submit`, and the session reaches
/// `Submitted` at most once.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    quiz: Arc<Quiz>,
    status: SessionStatus,
    clock: Option<CountdownClock>,
    capture: AnswerCapture,
}

impl Session {
    pub fn new(quiz: Arc<Quiz>) -> Self {
        Self {
            id: Uuid::new_v4(),
            quiz,
            status: SessionStatus::NotStarted,
            clock: None,
            capture: AnswerCapture::new(),
        }
    }

    /// Starts the countdown from the quiz's `HH:MM:SS` duration.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), AssessmentError> {
        if self.status != SessionStatus::NotStarted {
            return Err(AssessmentError::AlreadyStarted);
        }
        // A quiz without weight has no score.
        if scoring::total_points(&self.quiz)? <= 0 {
            return Err(AssessmentError::EmptyQuiz);
        }

        let seconds = parse_duration(&self.quiz.duration)?;
        self.clock = Some(CountdownClock::start(seconds, now)?);
        self.status = SessionStatus::InProgress;
        Ok(())
    }

    pub fn set_answer(
        &mut self,
        question_id: i64,
        value: Option<String>,
    ) -> Result<(), AssessmentError> {
        if self.status != SessionStatus::InProgress {
            return Err(AssessmentError::SessionClosed);
        }
        if !self.quiz.contains_question(question_id) {
            return Err(AssessmentError::QuestionNotFound(question_id));
        }

        self.capture.set(question_id, value);
        Ok(())
    }

    pub fn snapshot(&self) -> Vec<SubmittedAnswer> {
        self.capture.snapshot(&self.quiz)
    }

    /// One second of countdown. When this tick expires the clock, the
    /// session is submitted with whatever answers it holds.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<Option<Submission>, AssessmentError> {
        if self.status != SessionStatus::InProgress {
            return Ok(None);
        }

        let event = self.clock.as_mut().and_then(CountdownClock::tick);
        match event {
            Some(ClockEvent::Expired) => {
                let snapshot = self.snapshot();
                assembler::assemble(self, snapshot, now, true).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Manual submission.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<Submission, AssessmentError> {
        let snapshot = self.snapshot();
        assembler::assemble(self, snapshot, now, false)
    }

    /// Terminal transition; stops the clock so no expiry follows.
    pub(crate) fn close(&mut self) {
        if let Some(clock) = self.clock.as_mut() {
            clock.cancel();
        }
        self.status = SessionStatus::Submitted;
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.clock.as_ref().map(CountdownClock::started_at)
    }

    pub fn remaining_seconds(&self) -> i64 {
        self.clock.as_ref().map_or(0, CountdownClock::remaining)
    }

    pub fn answered(&self) -> usize {
        self.capture.answered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::sample_quiz;

    fn started(duration: &str) -> Session {
        let mut quiz = sample_quiz();
        quiz.duration = duration.to_string();
        let mut session = Session::new(Arc::new(quiz));
        session.start(Utc::now()).unwrap();
        session
    }

    #[test]
    fn start_moves_to_in_progress_once() {
        let mut session = Session::new(Arc::new(sample_quiz()));
        assert_eq!(session.status(), SessionStatus::NotStarted);
        assert_eq!(session.remaining_seconds(), 0);

        session.start(Utc::now()).unwrap();
        assert_eq!(session.status(), SessionStatus::InProgress);
        assert_eq!(session.remaining_seconds(), 600);
        assert_eq!(session.start(Utc::now()), Err(AssessmentError::AlreadyStarted));
    }

    #[test]
    fn start_rejects_bad_duration_and_empty_quiz() {
        let mut quiz = sample_quiz();
        quiz.duration = "ten minutes".to_string();
        let mut session = Session::new(Arc::new(quiz));
        assert!(matches!(
            session.start(Utc::now()),
            Err(AssessmentError::InvalidDuration(_))
        ));
        assert_eq!(session.status(), SessionStatus::NotStarted);

        let mut quiz = sample_quiz();
        quiz.questions.clear();
        let mut session = Session::new(Arc::new(quiz));
        assert_eq!(session.start(Utc::now()), Err(AssessmentError::EmptyQuiz));
    }

    #[test]
    fn start_rejects_negative_weight() {
        let mut quiz = sample_quiz();
        quiz.questions[0].points = -1;
        let mut session = Session::new(Arc::new(quiz));
        assert_eq!(
            session.start(Utc::now()),
            Err(AssessmentError::InvalidPoints(1))
        );
        assert_eq!(session.status(), SessionStatus::NotStarted);
    }

    #[test]
    fn answers_need_an_open_session() {
        let mut session = Session::new(Arc::new(sample_quiz()));
        assert_eq!(
            session.set_answer(1, Some("Paris".to_string())),
            Err(AssessmentError::SessionClosed)
        );

        session.start(Utc::now()).unwrap();
        session.set_answer(1, Some("Paris".to_string())).unwrap();
        assert_eq!(
            session.set_answer(42, Some("?".to_string())),
            Err(AssessmentError::QuestionNotFound(42))
        );

        session.submit(Utc::now()).unwrap();
        assert_eq!(
            session.set_answer(2, Some("True".to_string())),
            Err(AssessmentError::SessionClosed)
        );
    }

    #[test]
    fn expiry_submits_without_user_action() {
        let mut session = started("00:00:01");

        let submission = session
            .tick(Utc::now())
            .unwrap()
            .expect("expiry should submit");

        assert_eq!(session.status(), SessionStatus::Submitted);
        assert_eq!(submission.score, 0);
        assert!(submission.auto_submitted);
        assert_eq!(submission.answers.len(), 4);
        assert!(submission.answers.iter().all(|a| a.value.is_none()));

        // Drift: extra ticks after expiry are ignored.
        assert_eq!(session.tick(Utc::now()), Ok(None));
    }

    #[test]
    fn manual_submit_cancels_the_countdown() {
        let mut session = started("00:00:02");
        session.set_answer(1, Some("Paris".to_string())).unwrap();
        assert_eq!(session.tick(Utc::now()), Ok(None));

        let submission = session.submit(Utc::now()).unwrap();
        assert!(!submission.auto_submitted);
        assert_eq!(submission.score, 25);

        // The tick that would have expired the clock does nothing.
        assert_eq!(session.tick(Utc::now()), Ok(None));
        assert_eq!(session.remaining_seconds(), 1);
        assert_eq!(session.submit(Utc::now()), Err(AssessmentError::AlreadySubmitted));
    }
}
