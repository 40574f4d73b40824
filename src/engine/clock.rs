// src/engine/clock.rs

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::error::AssessmentError;

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3}):([0-5]\d):([0-5]\d)$").expect("duration pattern is valid")
});

/// Parses an `HH:MM:SS` duration into whole seconds.
///
/// Minutes and seconds must be two digits below 60. Anything else,
/// including a zero total, is rejected rather than defaulted.
pub fn parse_duration(raw: &str) -> Result<i64, AssessmentError> {
    let invalid = || AssessmentError::InvalidDuration(raw.to_string());

    let caps = DURATION_RE.captures(raw.trim()).ok_or_else(invalid)?;
    let field = |i: usize| -> Result<i64, AssessmentError> {
        caps[i].parse::<i64>().map_err(|_| invalid())
    };

    let seconds = field(1)? * 3600 + field(2)? * 60 + field(3)?;
    if seconds <= 0 {
        return Err(invalid());
    }
    Ok(seconds)
}

/// Emitted by [`CountdownClock::tick`] at most once per clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    Expired,
}

/// Countdown over whole seconds.
///
/// `tick` is the only way remaining time changes. Expiry is reported
/// once; after that, or after `cancel`, ticks are ignored.
#[derive(Debug, Clone)]
pub struct CountdownClock {
    duration: i64,
    remaining: i64,
    started_at: DateTime<Utc>,
    expiry_fired: bool,
    cancelled: bool,
}

impl CountdownClock {
    pub fn start(duration_seconds: i64, now: DateTime<Utc>) -> Result<Self, AssessmentError> {
        if duration_seconds <= 0 {
            return Err(AssessmentError::InvalidDuration(duration_seconds.to_string()));
        }

        Ok(Self {
            duration: duration_seconds,
            remaining: duration_seconds,
            started_at: now,
            expiry_fired: false,
            cancelled: false,
        })
    }

    /// Advances one second. Returns `Some(Expired)` on the tick that
    /// reaches zero and `None` on every other call.
    pub fn tick(&mut self) -> Option<ClockEvent> {
        if self.cancelled || self.remaining == 0 {
            return None;
        }

        self.remaining -= 1;

        if self.remaining == 0 && !self.expiry_fired {
            self.expiry_fired = true;
            return Some(ClockEvent::Expired);
        }
        None
    }

    /// Stops the clock; no expiry will be reported afterwards.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    pub fn duration(&self) -> i64 {
        self.duration
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_running(&self) -> bool {
        !self.cancelled && self.remaining > 0
    }
}
