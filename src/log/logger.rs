//! Logging entry points for simulation code
//!
//! Components should receive a [`Logger`] (or an `Arc<dyn LogSink>`) when they are built.
//! The process-wide default source exists for code that has no handle to hand.

use std::num::NonZeroUsize;
use std::sync::{Arc, OnceLock};

use super::buffer::BoundedLogBuffer;
use super::clock::SystemClock;
use super::entry::LogEntry;
use super::level::LogLevel;
use super::source::LogWindowSource;

/// Queue length of the process-wide default source
pub const DEFAULT_QUEUE_LENGTH: usize = 100;

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(DEFAULT_QUEUE_LENGTH) {
    Some(capacity) => capacity,
    None => panic!("DEFAULT_QUEUE_LENGTH must be non-zero"),
};

static DEFAULT_SOURCE: OnceLock<Arc<LogWindowSource>> = OnceLock::new();

/// The process-wide default log source, created on first use
pub fn default_log_source() -> Arc<LogWindowSource> {
    Arc::clone(DEFAULT_SOURCE.get_or_init(|| {
        let store = BoundedLogBuffer::from_capacity(DEFAULT_CAPACITY, Arc::new(SystemClock));
        Arc::new(LogWindowSource::with_store(Arc::new(store)))
    }))
}

/// Append a debug message to the default source
pub fn debug(message: impl Into<String>) {
    default_log_source().append(LogLevel::Debug, message);
}

/// Append an error message to the default source
pub fn error(message: impl Into<String>) {
    default_log_source().append(LogLevel::Error, message);
}

/// Append-only capability handed to log producers
pub trait LogSink: Send + Sync {
    fn append(&self, level: LogLevel, message: String) -> LogEntry;
}

impl LogSink for LogWindowSource {
    fn append(&self, level: LogLevel, message: String) -> LogEntry {
        LogWindowSource::append(self, level, message)
    }
}

/// Cloneable handle for emitting entries into a source
#[derive(Clone)]
pub struct Logger {
    source: Arc<LogWindowSource>,
}

impl Logger {
    pub fn new(source: Arc<LogWindowSource>) -> Self {
        Self { source }
    }

    /// Handle onto the process-wide default source
    pub fn global() -> Self {
        Self::new(default_log_source())
    }

    pub fn source(&self) -> &Arc<LogWindowSource> {
        &self.source
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) -> LogEntry {
        self.source.append(level, message)
    }

    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }
}

impl LogSink for Logger {
    fn append(&self, level: LogLevel, message: String) -> LogEntry {
        self.log(level, message)
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("entries", &self.source.size())
            .finish()
    }
}
