// src/engine/runtime.rs

//! Live sessions and the tasks that count them down.
//!
//! Each session sits behind its own async mutex. The ticker task and the
//! submit endpoint both take that lock before touching the session, so
//! only one of them can get past the status check and assemble.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::adapters::{Notification, NotificationSink, QuestionBank, SubmissionStore};
use crate::config::{CLOSED_SESSION_TTL, TICK_INTERVAL};
use crate::engine::grading;
use crate::engine::session::Session;
use crate::error::{AppError, AssessmentError};
use crate::models::quiz::PublicQuiz;
use crate::models::session::{SessionStarted, SessionStatus, SessionView};
use crate::models::submission::{Submission, SubmissionReceipt};

struct ActiveSession {
    session: Arc<Mutex<Session>>,
    ticker: JoinHandle<()>,
}

/// What is left of a session once it has been submitted.
#[derive(Debug)]
struct ClosedSession {
    quiz_id: i64,
    answered: usize,
    passing_score: i64,
    submission_id: Option<i64>,
    /// Assembled but not yet stored; the next submit retries the save.
    unsaved: Option<Submission>,
    closed_at: Instant,
}

impl ClosedSession {
    fn new(session: &Session) -> Self {
        Self {
            quiz_id: session.quiz().id,
            answered: session.answered(),
            passing_score: session.quiz().passing_score(),
            submission_id: None,
            unsaved: None,
            closed_at: Instant::now(),
        }
    }

    fn record(&mut self, result: &Result<SubmissionReceipt, AppError>, submission: Submission) {
        match result {
            Ok(receipt) => self.submission_id = Some(receipt.submission_id),
            Err(_) => self.unsaved = Some(submission),
        }
    }
}

#[derive(Default)]
struct Registry {
    active: HashMap<Uuid, ActiveSession>,
    closed: HashMap<Uuid, ClosedSession>,
}

impl Registry {
    /// Forgets closed sessions older than `ttl` unless they still hold an
    /// unsaved submission.
    fn prune(&mut self, ttl: Duration) {
        self.closed
            .retain(|_, c| c.unsaved.is_some() || c.closed_at.elapsed() < ttl);
    }
}

/// Result of a submit request.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Submitted(SubmissionReceipt),
    /// The session had already been submitted, by expiry or an earlier click.
    AlreadySubmitted { submission_id: Option<i64> },
}

pub struct SessionManager {
    bank: Arc<dyn QuestionBank>,
    store: Arc<dyn SubmissionStore>,
    notifier: Arc<dyn NotificationSink>,
    tick: Duration,
    closed_ttl: Duration,
    registry: StdMutex<Registry>,
}

impl SessionManager {
    pub fn new(
        bank: Arc<dyn QuestionBank>,
        store: Arc<dyn SubmissionStore>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            bank,
            store,
            notifier,
            tick: TICK_INTERVAL,
            closed_ttl: CLOSED_SESSION_TTL,
            registry: StdMutex::new(Registry::default()),
        }
    }

    pub fn bank(&self) -> &Arc<dyn QuestionBank> {
        &self.bank
    }

    pub fn store(&self) -> &Arc<dyn SubmissionStore> {
        &self.store
    }

    fn registry(&self) -> Result<MutexGuard<'_, Registry>, AppError> {
        self.registry
            .lock()
            .map_err(|_| AppError::InternalServerError("session registry poisoned".to_string()))
    }

    fn fail(&self, session_id: Option<Uuid>, reason: String) {
        self.notifier.notify(Notification::Failed { session_id, reason });
    }

    /// Loads the quiz, starts its countdown and spawns the ticker.
    pub async fn start_session(self: &Arc<Self>, quiz_id: i64) -> Result<SessionStarted, AppError> {
        let quiz = self.bank.get_quiz(quiz_id).await.inspect_err(|e| {
            self.fail(None, format!("could not load quiz {}: {}", quiz_id, e));
        })?;

        let mut session = Session::new(Arc::new(quiz));
        session.start(Utc::now()).inspect_err(|e| {
            self.fail(None, format!("could not start quiz {}: {}", quiz_id, e));
        })?;

        let session_id = session.id();
        let started = SessionStarted {
            session_id,
            quiz: PublicQuiz::from(session.quiz()),
            remaining_seconds: session.remaining_seconds(),
        };

        let session = Arc::new(Mutex::new(session));
        let ticker = tokio::spawn(Arc::clone(self).run_ticker(session_id, Arc::clone(&session)));
        self.registry()?
            .active
            .insert(session_id, ActiveSession { session, ticker });

        tracing::info!(%session_id, quiz_id, "Session started");
        Ok(started)
    }

    fn active(&self, session_id: Uuid) -> Result<Arc<Mutex<Session>>, AppError> {
        let registry = self.registry()?;
        if let Some(active) = registry.active.get(&session_id) {
            return Ok(Arc::clone(&active.session));
        }
        if registry.closed.contains_key(&session_id) {
            return Err(AssessmentError::SessionClosed.into());
        }
        Err(AssessmentError::SessionNotFound(session_id).into())
    }

    pub async fn set_answer(
        &self,
        session_id: Uuid,
        question_id: i64,
        value: Option<String>,
    ) -> Result<(), AppError> {
        let session = self.active(session_id)?;
        let mut guard = session.lock().await;
        guard.set_answer(question_id, value)?;
        Ok(())
    }

    pub async fn view(&self, session_id: Uuid) -> Result<SessionView, AppError> {
        let session = match self.active(session_id) {
            Ok(session) => session,
            Err(AppError::Assessment(AssessmentError::SessionClosed)) => {
                let registry = self.registry()?;
                let closed = registry
                    .closed
                    .get(&session_id)
                    .ok_or(AssessmentError::SessionNotFound(session_id))?;
                return Ok(SessionView {
                    session_id,
                    quiz_id: closed.quiz_id,
                    status: SessionStatus::Submitted,
                    remaining_seconds: 0,
                    answered: closed.answered,
                });
            }
            Err(e) => return Err(e),
        };

        let guard = session.lock().await;
        Ok(SessionView {
            session_id,
            quiz_id: guard.quiz().id,
            status: guard.status(),
            remaining_seconds: guard.remaining_seconds(),
            answered: guard.answered(),
        })
    }

    /// Manual submission. A session that was already submitted yields
    /// `SubmitOutcome::AlreadySubmitted` instead of an error, unless its
    /// submission was never stored, in which case the save is retried.
    pub async fn submit(&self, session_id: Uuid) -> Result<SubmitOutcome, AppError> {
        let session = match self.active(session_id) {
            Ok(session) => session,
            Err(AppError::Assessment(AssessmentError::SessionClosed)) => {
                return self.resubmit(session_id).await;
            }
            Err(e) => return Err(e),
        };

        let mut guard = session.lock().await;
        match guard.submit(Utc::now()) {
            Ok(submission) => {
                let result = self.settle(session_id, &guard, submission).await;
                drop(guard);
                result.map(SubmitOutcome::Submitted)
            }
            Err(AssessmentError::AlreadySubmitted) => {
                drop(guard);
                self.resubmit(session_id).await
            }
            Err(e) => {
                self.fail(Some(session_id), e.to_string());
                Err(e.into())
            }
        }
    }

    /// Submit on a closed session: a no-op, or a retry of an unsaved submission.
    async fn resubmit(&self, session_id: Uuid) -> Result<SubmitOutcome, AppError> {
        let (submission, passing_score) = {
            let mut registry = self.registry()?;
            let closed = registry
                .closed
                .get_mut(&session_id)
                .ok_or(AssessmentError::SessionNotFound(session_id))?;
            match closed.unsaved.take() {
                Some(submission) => (submission, closed.passing_score),
                None => {
                    tracing::warn!(%session_id, "Duplicate submit ignored");
                    return Ok(SubmitOutcome::AlreadySubmitted {
                        submission_id: closed.submission_id,
                    });
                }
            }
        };

        tracing::info!(%session_id, "Retrying unsaved submission");
        let result = self.persist(session_id, &submission, passing_score).await;

        match self.registry()?.closed.get_mut(&session_id) {
            Some(closed) => closed.record(&result, submission),
            None => tracing::error!(%session_id, "Closed session vanished during retry"),
        }
        result.map(SubmitOutcome::Submitted)
    }

    /// Drops an unsubmitted session. Nothing is persisted.
    pub fn discard(&self, session_id: Uuid) -> Result<(), AppError> {
        let active = self
            .registry()?
            .active
            .remove(&session_id)
            .ok_or(AssessmentError::SessionNotFound(session_id))?;
        active.ticker.abort();
        tracing::info!(%session_id, "Session discarded");
        Ok(())
    }

    pub fn active_sessions(&self) -> usize {
        self.registry().map(|r| r.active.len()).unwrap_or(0)
    }

    pub fn closed_sessions(&self) -> usize {
        self.registry().map(|r| r.closed.len()).unwrap_or(0)
    }

    /// Stores a freshly assembled submission and moves the session to the
    /// closed set. Callers hold the session lock throughout.
    async fn settle(
        &self,
        session_id: Uuid,
        session: &Session,
        submission: Submission,
    ) -> Result<SubmissionReceipt, AppError> {
        let mut closed = ClosedSession::new(session);
        let result = self.persist(session_id, &submission, closed.passing_score).await;
        closed.record(&result, submission);

        // When the ticker settles its own expiry it returns without yielding again.
        if let Some(active) = self.finish(session_id, closed) {
            active.ticker.abort();
        }
        result
    }

    async fn persist(
        &self,
        session_id: Uuid,
        submission: &Submission,
        passing_score: i64,
    ) -> Result<SubmissionReceipt, AppError> {
        let submission_id = self.store.save_submission(submission).await.inspect_err(|e| {
            tracing::error!(%session_id, "Failed to persist submission: {}", e);
            self.fail(Some(session_id), format!("could not save submission: {}", e));
        })?;

        let passed = grading::passed(submission.score, passing_score);
        self.notifier.notify(Notification::Submitted {
            session_id,
            submission_id,
            score: submission.score,
            passed,
            auto_submitted: submission.auto_submitted,
        });

        Ok(SubmissionReceipt {
            submission_id,
            score: submission.score,
            grade: grading::letter_grade(submission.score),
            passed,
            time_taken: submission.time_taken.clone(),
            auto_submitted: submission.auto_submitted,
        })
    }

    /// Moves a session from the active set to the closed set.
    fn finish(&self, session_id: Uuid, closed: ClosedSession) -> Option<ActiveSession> {
        let mut registry = self.registry().ok()?;
        registry.prune(self.closed_ttl);
        registry.closed.insert(session_id, closed);
        registry.active.remove(&session_id)
    }

    async fn run_ticker(self: Arc<Self>, session_id: Uuid, session: Arc<Mutex<Session>>) {
        let mut interval = tokio::time::interval_at(Instant::now() + self.tick, self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            interval.tick().await;

            let mut guard = session.lock().await;
            match guard.tick(Utc::now()) {
                Ok(None) if guard.status() == SessionStatus::InProgress => continue,
                Ok(None) | Err(AssessmentError::AlreadySubmitted) => return,
                Ok(Some(submission)) => {
                    tracing::warn!(%session_id, "Time expired, submitting automatically");
                    let _ = self.settle(session_id, &guard, submission).await;
                    return;
                }
                Err(e) => {
                    tracing::error!(%session_id, "Automatic submission failed: {}", e);
                    self.fail(Some(session_id), e.to_string());
                    self.finish(session_id, ClosedSession::new(&guard));
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryQuestionBank, InMemorySubmissionStore};
    use crate::adapters::notify::RecordingNotifier;
    use crate::engine::grading::Grade;
    use crate::engine::test_support::sample_quiz;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Store that refuses writes while `down` is set.
    #[derive(Default)]
    struct FlakyStore {
        down: AtomicBool,
        inner: InMemorySubmissionStore,
    }

    #[async_trait]
    impl SubmissionStore for FlakyStore {
        async fn save_submission(&self, submission: &Submission) -> Result<i64, AppError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(AppError::InternalServerError("db down".to_string()));
            }
            self.inner.save_submission(submission).await
        }

        async fn get_submission(&self, submission_id: i64) -> Result<Submission, AppError> {
            self.inner.get_submission(submission_id).await
        }
    }

    fn flaky_harness(duration: &str) -> (Arc<SessionManager>, Arc<FlakyStore>, Arc<RecordingNotifier>) {
        let mut quiz = sample_quiz();
        quiz.duration = duration.to_string();
        let store = Arc::new(FlakyStore::default());
        store.down.store(true, Ordering::SeqCst);
        let notifier = Arc::new(RecordingNotifier::new());
        let manager = Arc::new(SessionManager::new(
            Arc::new(InMemoryQuestionBank::with_quizzes([quiz])),
            store.clone(),
            notifier.clone(),
        ));
        (manager, store, notifier)
    }

    struct Harness {
        manager: Arc<SessionManager>,
        store: Arc<InMemorySubmissionStore>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness(duration: &str) -> Harness {
        let mut quiz = sample_quiz();
        quiz.duration = duration.to_string();
        let bank = Arc::new(InMemoryQuestionBank::with_quizzes([quiz]));
        let store = Arc::new(InMemorySubmissionStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let manager = Arc::new(SessionManager::new(
            bank,
            store.clone(),
            notifier.clone(),
        ));
        Harness {
            manager,
            store,
            notifier,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_submits_once_without_user_action() {
        let h = harness("00:00:01");
        let started = h.manager.start_session(7).await.unwrap();
        assert_eq!(started.remaining_seconds, 1);

        tokio::time::sleep(Duration::from_secs(3)).await;

        let saved = h.store.all();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].score, 0);
        assert!(saved[0].auto_submitted);
        assert!(saved[0].answers.iter().all(|a| a.value.is_none()));

        let view = h.manager.view(started.session_id).await.unwrap();
        assert_eq!(view.status, SessionStatus::Submitted);
        assert_eq!(h.manager.active_sessions(), 0);

        // A late click after expiry is a no-op.
        let outcome = h.manager.submit(started.session_id).await.unwrap();
        assert!(matches!(
            outcome,
            SubmitOutcome::AlreadySubmitted { submission_id: Some(1) }
        ));
        assert_eq!(h.store.len(), 1);

        assert!(matches!(
            h.notifier.received().as_slice(),
            [Notification::Submitted { score: 0, passed: false, auto_submitted: true, .. }]
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn manual_submit_stops_the_countdown() {
        let h = harness("00:00:02");
        let started = h.manager.start_session(7).await.unwrap();
        let id = started.session_id;

        h.manager.set_answer(id, 1, Some("Paris".to_string())).await.unwrap();
        h.manager.set_answer(id, 2, Some("True".to_string())).await.unwrap();
        h.manager.set_answer(id, 3, Some("Powerhouse ".to_string())).await.unwrap();

        let SubmitOutcome::Submitted(receipt) = h.manager.submit(id).await.unwrap() else {
            panic!("expected a fresh submission");
        };
        assert_eq!(receipt.score, 75);
        assert_eq!(receipt.grade, Grade::B);
        assert!(receipt.passed);
        assert!(!receipt.auto_submitted);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(h.store.len(), 1);

        let view = h.manager.view(id).await.unwrap();
        assert_eq!(view.status, SessionStatus::Submitted);
        assert_eq!(view.answered, 3);

        let err = h
            .manager
            .set_answer(id, 4, Some("Au".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Assessment(AssessmentError::SessionClosed)));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_submits_persist_once() {
        let h = harness("00:10:00");
        let id = h.manager.start_session(7).await.unwrap().session_id;

        let (a, b) = tokio::join!(h.manager.submit(id), h.manager.submit(id));
        let outcomes = [a.unwrap(), b.unwrap()];

        let fresh = outcomes
            .iter()
            .filter(|o| matches!(o, SubmitOutcome::Submitted(_)))
            .count();
        assert_eq!(fresh, 1);
        assert_eq!(h.store.len(), 1);

        // The loser waited on the lock and still sees the stored id.
        assert!(outcomes.iter().any(|o| matches!(
            o,
            SubmitOutcome::AlreadySubmitted { submission_id: Some(1) }
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn discarded_session_persists_nothing() {
        let h = harness("00:00:01");
        let id = h.manager.start_session(7).await.unwrap().session_id;
        h.manager.discard(id).unwrap();

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(h.store.is_empty());

        let err = h.manager.submit(id).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Assessment(AssessmentError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn unknown_quiz_is_reported() {
        let h = harness("00:10:00");
        let err = h.manager.start_session(99).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Assessment(AssessmentError::QuizNotFound(99))
        ));
        assert!(matches!(
            h.notifier.received().as_slice(),
            [Notification::Failed { session_id: None, .. }]
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_and_submit_at_the_same_instant_persist_once() {
        let h = harness("00:00:01");
        let id = h.manager.start_session(7).await.unwrap().session_id;

        // Wakes at the same instant as the expiring tick.
        tokio::time::sleep(Duration::from_secs(1)).await;
        let outcome = h.manager.submit(id).await.unwrap();

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(h.store.len(), 1);
        match outcome {
            SubmitOutcome::Submitted(receipt) => assert_eq!(receipt.submission_id, 1),
            SubmitOutcome::AlreadySubmitted { submission_id } => {
                assert_eq!(submission_id, Some(1))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_save_is_retried_on_next_submit() {
        let (manager, store, notifier) = flaky_harness("00:10:00");
        let id = manager.start_session(7).await.unwrap().session_id;
        manager.set_answer(id, 1, Some("Paris".to_string())).await.unwrap();

        let err = manager.submit(id).await.unwrap_err();
        assert!(matches!(err, AppError::InternalServerError(_)));
        assert!(store.inner.is_empty());
        assert!(matches!(
            notifier.received().as_slice(),
            [Notification::Failed { session_id: Some(_), .. }]
        ));

        // Still down: the submission is kept for the next attempt.
        assert!(manager.submit(id).await.is_err());

        store.down.store(false, Ordering::SeqCst);
        let SubmitOutcome::Submitted(receipt) = manager.submit(id).await.unwrap() else {
            panic!("expected the unsaved submission to be stored");
        };
        assert_eq!(receipt.submission_id, 1);
        assert_eq!(receipt.score, 25);
        assert_eq!(store.inner.len(), 1);

        let again = manager.submit(id).await.unwrap();
        assert!(matches!(
            again,
            SubmitOutcome::AlreadySubmitted { submission_id: Some(1) }
        ));
        assert_eq!(store.inner.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_attempt_survives_a_failed_save() {
        let (manager, store, _notifier) = flaky_harness("00:00:01");
        let id = manager.start_session(7).await.unwrap().session_id;

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(store.inner.is_empty());
        assert_eq!(manager.view(id).await.unwrap().status, SessionStatus::Submitted);

        store.down.store(false, Ordering::SeqCst);
        let SubmitOutcome::Submitted(receipt) = manager.submit(id).await.unwrap() else {
            panic!("expected the expired attempt to be stored");
        };
        assert!(receipt.auto_submitted);
        assert_eq!(store.inner.all()[0].score, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_sessions_are_forgotten_after_ttl() {
        let h = harness("00:10:00");
        let first = h.manager.start_session(7).await.unwrap().session_id;
        h.manager.submit(first).await.unwrap();
        assert_eq!(h.manager.closed_sessions(), 1);

        tokio::time::sleep(CLOSED_SESSION_TTL + Duration::from_secs(1)).await;

        let second = h.manager.start_session(7).await.unwrap().session_id;
        h.manager.submit(second).await.unwrap();
        assert_eq!(h.manager.closed_sessions(), 1);

        let err = h.manager.view(first).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Assessment(AssessmentError::SessionNotFound(_))
        ));
        assert_eq!(h.manager.view(second).await.unwrap().status, SessionStatus::Submitted);
    }

    #[tokio::test(start_paused = true)]
    async fn unsaved_submissions_outlive_the_ttl() {
        let (manager, store, _notifier) = flaky_harness("00:10:00");
        let first = manager.start_session(7).await.unwrap().session_id;
        assert!(manager.submit(first).await.is_err());

        tokio::time::sleep(CLOSED_SESSION_TTL + Duration::from_secs(1)).await;

        let second = manager.start_session(7).await.unwrap().session_id;
        assert!(manager.submit(second).await.is_err());
        assert_eq!(manager.closed_sessions(), 2);

        store.down.store(false, Ordering::SeqCst);
        assert!(matches!(
            manager.submit(first).await.unwrap(),
            SubmitOutcome::Submitted(_)
        ));
    }
}
