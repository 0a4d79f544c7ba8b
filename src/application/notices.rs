//! Transient user-facing notices.
//!
//! Failures that must not disturb local state (a chat send that the backend
//! rejected, a profile update that went through) surface here instead of in
//! return values. The sink trait keeps the presentation layer pluggable; the
//! in-memory log backs tests.

use std::sync::Mutex;

use time::OffsetDateTime;

use crate::util::lock::mutex_lock;

const SOURCE: &str = "application::notices";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// One transient message shown to the user.
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: OffsetDateTime,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            raised_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Destination for transient notices.
pub trait NoticeSink: Send + Sync {
    fn raise(&self, notice: Notice);

    fn info(&self, message: &str) {
        self.raise(Notice::new(NoticeLevel::Info, message));
    }

    fn success(&self, message: &str) {
        self.raise(Notice::new(NoticeLevel::Success, message));
    }

    fn error(&self, message: &str) {
        self.raise(Notice::new(NoticeLevel::Error, message));
    }
}

/// In-memory sink that accumulates notices until drained.
#[derive(Default)]
pub struct NoticeLog {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.notices, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every pending notice, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        mutex_lock(&self.notices, SOURCE, "drain")
            .drain(..)
            .collect()
    }
}

impl NoticeSink for NoticeLog {
    fn raise(&self, notice: Notice) {
        mutex_lock(&self.notices, SOURCE, "raise").push(notice);
    }
}
