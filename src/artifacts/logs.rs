//! Captured log records and assertions over them.
//!
//! [`LogCapture`] is a `tracing_subscriber` layer; install it on a registry for the duration of a test and read
//! the records back afterwards.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// One captured event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub target: String,
    pub message: String,
}

/// Layer that keeps every event it sees. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records captured so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn clear(&self) {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let metadata = event.metadata();
        let record = LogRecord {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.message,
        };
        self.records.lock().unwrap_or_else(PoisonError::into_inner).push(record);
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("\"{sub_message}\" not found in any {level} logs {expected} times, was found {seen} times")]
pub struct LogAssertionError {
    pub sub_message: String,
    pub level: Level,
    pub expected: usize,
    pub seen: usize,
}

/// Check that exactly `count` records at `level` contain `sub_message` (or at least `count` with `allow_more`).
pub fn assert_logs_messages(
    records: &[LogRecord],
    sub_message: &str,
    level: Level,
    count: usize,
    allow_more: bool,
) -> Result<(), LogAssertionError> {
    let seen = records
        .iter()
        .filter(|r| r.level == level && r.message.contains(sub_message))
        .count();
    if seen == count || (allow_more && seen > count) {
        return Ok(());
    }
    Err(LogAssertionError {
        sub_message: sub_message.to_string(),
        level,
        expected: count,
        seen,
    })
}
