//! Storage abstraction shared by the bounded and temporal stores

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::entry::LogEntry;
use super::level::LogLevel;

/// An append-only, self-bounding store of log entries
///
/// Implementations serialize appends internally and may be shared across threads.
/// Reads return owned snapshots in insertion order.
pub trait LogStore: Send + Sync {
    /// Store a new entry stamped with the store's clock and return a copy of it
    fn append(&self, level: LogLevel, message: String) -> LogEntry;

    /// Snapshot of every live entry, oldest first
    fn all(&self) -> Vec<LogEntry>;

    /// Number of live entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Up to `count` entries starting at logical offset `start`
    ///
    /// Returns an empty vector when `start` is past the end.
    fn slice(&self, start: usize, count: usize) -> Vec<LogEntry> {
        self.all().into_iter().skip(start).take(count).collect()
    }
}

// Every write path leaves its collection consistent before anything that can panic,
// so a poisoned lock still guards valid data.
pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
