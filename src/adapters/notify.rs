// src/adapters/notify.rs

use std::sync::Mutex;

use crate::adapters::{Notification, NotificationSink};

/// Emits notifications as tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::Submitted {
                session_id,
                submission_id,
                score,
                passed,
                auto_submitted,
            } => {
                tracing::info!(
                    %session_id,
                    submission_id,
                    score,
                    passed,
                    auto_submitted,
                    "Assessment submitted"
                );
            }
            Notification::Failed { session_id, reason } => match session_id {
                Some(id) => tracing::error!(session_id = %id, "Assessment failed: {}", reason),
                None => tracing::error!("Assessment failed: {}", reason),
            },
        }
    }
}

/// Keeps every notification in memory so callers can inspect them later.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<Notification> {
        self.received.lock().map(|n| n.clone()).unwrap_or_default()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut received) = self.received.lock() {
            received.push(notification);
        }
    }
}
