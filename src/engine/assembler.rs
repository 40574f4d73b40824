// src/engine/assembler.rs

use chrono::{DateTime, Utc};

use crate::engine::scoring;
use crate::engine::session::Session;
use crate::error::AssessmentError;
use crate::models::session::SessionStatus;
use crate::models::submission::{Submission, SubmittedAnswer};

/// Formats elapsed wall-clock time as `"<minutes>m <seconds>s"`.
/// Sub-second remainders are dropped; a clock that went backwards reads as zero.
pub fn format_elapsed(started_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let total = (now - started_at).num_seconds().max(0);
    format!("{}m {}s", total / 60, total % 60)
}

/// Turns a session's answers into its one and only `Submission`.
///
/// Fails with `AlreadySubmitted` on a second call, which makes duplicate
/// expiry or duplicate clicks harmless. Scoring happens before the status
/// flips, so a failed assembly leaves the session open.
pub fn assemble(
    session: &mut Session,
    snapshot: Vec<SubmittedAnswer>,
    now: DateTime<Utc>,
    auto_submitted: bool,
) -> Result<Submission, AssessmentError> {
    let started_at = match (session.status(), session.started_at()) {
        (SessionStatus::Submitted, _) => return Err(AssessmentError::AlreadySubmitted),
        (SessionStatus::InProgress, Some(started_at)) => started_at,
        _ => return Err(AssessmentError::SessionClosed),
    };

    let summary = scoring::score_answers(session.quiz(), &snapshot)?;

    let submission = Submission {
        quiz_id: session.quiz().id,
        answers: snapshot,
        time_taken: format_elapsed(started_at, now),
        score: summary.score,
        auto_submitted,
        submitted_at: now,
    };

    session.close();
    Ok(submission)
}
