//! A single immutable log record

use std::fmt;

use chrono::{DateTime, Utc};
use super::level::LogLevel;

/// A single log entry
///
/// Fields are only readable through accessors; an entry never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    level: LogLevel,
    message: String,
    created_at: DateTime<Utc>,
}

impl LogEntry {
    /// Create a new log entry stamped with the current time
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self::at(level, message, Utc::now())
    }

    /// Create a log entry with an explicit creation time
    pub fn at(level: LogLevel, message: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            level,
            message: message.into(),
            created_at,
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Creation time as milliseconds since the Unix epoch
    pub fn created_at_millis(&self) -> i64 {
        self.created_at.timestamp_millis()
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}
