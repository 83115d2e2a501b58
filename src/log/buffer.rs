//! Fixed-capacity log buffer
//!
//! Keeps the most recent `capacity` entries, dropping the oldest on overflow.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock};

use super::clock::{Clock, SystemClock};
use super::entry::LogEntry;
use super::level::LogLevel;
use super::store::{read_lock, write_lock, LogStore};
use crate::error::{LogError, Result};

/// Thread-safe ring buffer for storing log entries
pub struct BoundedLogBuffer {
    /// Live entries, oldest at the front
    entries: RwLock<VecDeque<LogEntry>>,
    /// Maximum entries to keep
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl BoundedLogBuffer {
    /// Create a new log buffer holding at most `capacity` entries
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    /// Create a buffer that timestamps entries with the given clock
    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            LogError::InvalidConfiguration("queue length must be greater than zero".to_string())
        })?;
        Ok(Self::from_capacity(capacity, clock))
    }

    pub fn from_capacity(capacity: NonZeroUsize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity.get())),
            capacity: capacity.get(),
            clock,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl LogStore for BoundedLogBuffer {
    fn append(&self, level: LogLevel, message: String) -> LogEntry {
        let mut entries = write_lock(&self.entries);
        let entry = LogEntry::at(level, message, self.clock.now());
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry.clone());
        entry
    }

    fn all(&self) -> Vec<LogEntry> {
        read_lock(&self.entries).iter().cloned().collect()
    }

    fn len(&self) -> usize {
        read_lock(&self.entries).len()
    }

    fn slice(&self, start: usize, count: usize) -> Vec<LogEntry> {
        read_lock(&self.entries)
            .iter()
            .skip(start)
            .take(count)
            .cloned()
            .collect()
    }
}
