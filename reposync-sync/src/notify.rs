//! User-facing notifications emitted at the end of every sync.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use reposync_core::ProjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

/// A short message plus, on failure, the underlying reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub project: ProjectId,
    pub level: Level,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub at: DateTime<Utc>,
}

impl Notification {
    pub fn success(project: ProjectId, message: impl Into<String>) -> Self {
        Self {
            project,
            level: Level::Success,
            message: message.into(),
            reason: None,
            at: Utc::now(),
        }
    }

    pub fn failure(project: ProjectId, message: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            project,
            level: Level::Error,
            message: message.into(),
            reason: Some(reason.into()),
            at: Utc::now(),
        }
    }
}

/// Where terminal-state notifications go.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Writes notifications to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: &Notification) {
        match n.level {
            Level::Success => tracing::info!(project = %n.project, "{}", n.message),
            Level::Error => tracing::error!(
                project = %n.project,
                reason = n.reason.as_deref().unwrap_or(""),
                "{}",
                n.message
            ),
        }
    }
}

/// Keeps every notification; for tests and headless callers.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.seen
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(notification.clone());
    }
}
