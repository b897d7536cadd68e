//! Notification service implementation
//!
//! Every dashboard write reports its outcome here. The presentation layer
//! drains the channel and renders each [`Notice`] as a dismissible toast, so a
//! failed write is never silent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use crate::utils::errors::{ErrorSeverity, Result, UniExpError};

const NOTICE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A user-visible message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub dismissible: bool,
    pub created_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            dismissible: true,
            created_at: Utc::now(),
        }
    }

    pub fn from_error(error: &UniExpError) -> Self {
        let level = match error.severity() {
            ErrorSeverity::Info | ErrorSeverity::Warning => NoticeLevel::Warning,
            ErrorSeverity::Error | ErrorSeverity::Critical => NoticeLevel::Error,
        };
        Self::new(level, error.user_message())
    }
}

/// Notification statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationStats {
    pub successes: u64,
    pub failures: u64,
}

#[derive(Debug, Clone)]
pub struct NotificationService {
    sender: broadcast::Sender<Notice>,
    successes: Arc<AtomicU64>,
    failures: Arc<AtomicU64>,
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationService {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);
        Self {
            sender,
            successes: Arc::new(AtomicU64::new(0)),
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Receive every notice published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    pub fn publish(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success | NoticeLevel::Info => self.successes.fetch_add(1, Ordering::Relaxed),
            NoticeLevel::Warning | NoticeLevel::Error => self.failures.fetch_add(1, Ordering::Relaxed),
        };
        debug!(level = ?notice.level, message = %notice.message, "Notice published");
        // Nobody listening is fine: the outcome is still returned to the caller
        let _ = self.sender.send(notice);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(Notice::new(NoticeLevel::Success, message));
    }

    pub fn failure(&self, error: &UniExpError) {
        warn!(error = %error, "Operation failed");
        self.publish(Notice::from_error(error));
    }

    /// Publish the outcome of an operation and hand the result back unchanged
    pub fn report<T>(&self, result: Result<T>, success_message: impl FnOnce(&T) -> String) -> Result<T> {
        match &result {
            Ok(value) => self.success(success_message(value)),
            Err(error) => self.failure(error),
        }
        result
    }

    pub fn stats(&self) -> NotificationStats {
        NotificationStats {
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}
