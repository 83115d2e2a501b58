//! Time-partitioned log store with retention
//!
//! Entries are grouped into partitions keyed by their arrival millisecond. Every append
//! sweeps away partitions that have fallen behind `now - retention`, so memory stays
//! bounded without a background timer.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::DateTime;

use super::clock::{Clock, SystemClock};
use super::entry::LogEntry;
use super::level::LogLevel;
use super::store::{read_lock, write_lock, LogStore};
use crate::error::{LogError, Result};

#[derive(Debug, Default)]
struct Partitions {
    /// Arrival millisecond -> entries in insertion order
    windows: BTreeMap<i64, Vec<LogEntry>>,
    /// Key used by the most recent append
    last_millis: Option<i64>,
}

/// Concurrent log store that expires entries older than a retention window
pub struct TemporalLogStructure {
    inner: RwLock<Partitions>,
    retention: Duration,
    retention_millis: i64,
    clock: Arc<dyn Clock>,
}

impl TemporalLogStructure {
    /// Create a store that keeps entries for `retention`
    pub fn new(retention: Duration) -> Result<Self> {
        Self::with_clock(retention, Arc::new(SystemClock))
    }

    /// Create a store driven by the given clock
    pub fn with_clock(retention: Duration, clock: Arc<dyn Clock>) -> Result<Self> {
        let retention_millis = i64::try_from(retention.as_millis())
            .ok()
            .filter(|millis| *millis > 0)
            .ok_or_else(|| {
                LogError::InvalidConfiguration(format!(
                    "retention must be at least 1ms and fit in i64 milliseconds, got {:?}",
                    retention
                ))
            })?;

        Ok(Self {
            inner: RwLock::new(Partitions::default()),
            retention,
            retention_millis,
            clock,
        })
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Append an entry stamped with the current time, then evict expired partitions
    pub fn append(&self, level: LogLevel, message: impl Into<String>) -> LogEntry {
        let mut inner = write_lock(&self.inner);

        // A clock stepping backwards must not file an entry ahead of older ones.
        let mut now = self.clock.now();
        if let Some(last) = inner.last_millis {
            if now.timestamp_millis() < last {
                now = DateTime::from_timestamp_millis(last).unwrap_or(now);
            }
        }
        let key = now.timestamp_millis();

        let entry = LogEntry::at(level, message, now);
        inner.windows.entry(key).or_default().push(entry.clone());
        inner.last_millis = Some(key);

        let horizon = key.saturating_sub(self.retention_millis);
        let expired = inner
            .windows
            .first_key_value()
            .is_some_and(|(oldest, _)| *oldest < horizon);
        if expired {
            let live = inner.windows.split_off(&horizon);
            inner.windows = live;
        }

        entry
    }

    /// Entries whose partition key lies in `[start_millis, end_millis]`, oldest first
    pub fn range(&self, start_millis: i64, end_millis: i64) -> Vec<LogEntry> {
        if start_millis > end_millis {
            return Vec::new();
        }
        read_lock(&self.inner)
            .windows
            .range(start_millis..=end_millis)
            .flat_map(|(_, window)| window.iter().cloned())
            .collect()
    }

    /// Total number of live entries across all partitions
    pub fn size(&self) -> usize {
        read_lock(&self.inner).windows.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Number of live partitions
    pub fn partition_count(&self) -> usize {
        read_lock(&self.inner).windows.len()
    }

    /// Snapshot of all live entries, oldest first
    pub fn all(&self) -> Vec<LogEntry> {
        read_lock(&self.inner)
            .windows
            .values()
            .flat_map(|window| window.iter().cloned())
            .collect()
    }

    /// Lazy traversal over live entries
    ///
    /// The iterator holds no lock between steps, so appends proceed while it is in
    /// use. Entries evicted mid-traversal may be skipped; none is yielded twice.
    pub fn iter(&self) -> TemporalLogIter<'_> {
        TemporalLogIter {
            structure: self,
            cursor: None,
        }
    }
}

impl LogStore for TemporalLogStructure {
    fn append(&self, level: LogLevel, message: String) -> LogEntry {
        TemporalLogStructure::append(self, level, message)
    }

    fn all(&self) -> Vec<LogEntry> {
        TemporalLogStructure::all(self)
    }

    fn len(&self) -> usize {
        self.size()
    }

    fn slice(&self, start: usize, count: usize) -> Vec<LogEntry> {
        read_lock(&self.inner)
            .windows
            .values()
            .flat_map(|window| window.iter())
            .skip(start)
            .take(count)
            .cloned()
            .collect()
    }
}

impl<'a> IntoIterator for &'a TemporalLogStructure {
    type Item = LogEntry;
    type IntoIter = TemporalLogIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Cursor-based iterator over a [`TemporalLogStructure`]
pub struct TemporalLogIter<'a> {
    structure: &'a TemporalLogStructure,
    /// Partition key and offset of the next entry to yield
    cursor: Option<(i64, usize)>,
}

impl Iterator for TemporalLogIter<'_> {
    type Item = LogEntry;

    fn next(&mut self) -> Option<LogEntry> {
        let inner = read_lock(&self.structure.inner);

        let lower = match self.cursor {
            Some((key, _)) => Bound::Included(key),
            None => Bound::Unbounded,
        };

        // Keys only grow and a key is never reused after eviction, so resuming at
        // (key, offset) cannot revisit an entry.
        for (key, window) in inner.windows.range((lower, Bound::Unbounded)) {
            let offset = match self.cursor {
                Some((cursor_key, offset)) if cursor_key == *key => offset,
                _ => 0,
            };
            if let Some(entry) = window.get(offset) {
                self.cursor = Some((*key, offset + 1));
                return Some(entry.clone());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::clock::ManualClock;
    use std::thread;

    fn structure(retention_ms: u64, start_ms: i64) -> (TemporalLogStructure, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start_ms));
        let structure =
            TemporalLogStructure::with_clock(Duration::from_millis(retention_ms), clock.clone())
                .unwrap();
        (structure, clock)
    }

    fn messages(entries: &[LogEntry]) -> Vec<String> {
        entries.iter().map(|e| e.message().to_string()).collect()
    }

    #[test]
    fn test_zero_retention_rejected() {
        assert!(matches!(
            TemporalLogStructure::new(Duration::ZERO),
            Err(LogError::InvalidConfiguration(_))
        ));
        assert!(TemporalLogStructure::new(Duration::from_micros(500)).is_err());
        assert!(TemporalLogStructure::new(Duration::from_millis(1)).is_ok());
    }

    #[test]
    fn test_append_evicts_expired_partitions() {
        let (log, clock) = structure(1_000, 10_000);

        log.append(LogLevel::Debug, "a");
        clock.advance(Duration::from_millis(600));
        log.append(LogLevel::Debug, "b");
        clock.advance(Duration::from_millis(600));
        log.append(LogLevel::Debug, "c");

        assert_eq!(messages(&log.all()), ["b", "c"]);
        assert_eq!(log.size(), 2);
        assert_eq!(log.partition_count(), 2);
    }

    #[test]
    fn test_entry_exactly_at_retention_is_kept() {
        let (log, clock) = structure(1_000, 0);

        log.append(LogLevel::Info, "old");
        clock.advance(Duration::from_millis(1_000));
        log.append(LogLevel::Info, "new");
        assert_eq!(messages(&log.all()), ["old", "new"]);

        clock.advance(Duration::from_millis(1));
        log.append(LogLevel::Info, "newer");
        assert_eq!(messages(&log.all()), ["new", "newer"]);
    }

    #[test]
    fn test_same_millisecond_shares_partition() {
        let (log, _clock) = structure(1_000, 0);
        for msg in ["a", "b", "c"] {
            log.append(LogLevel::Trace, msg);
        }
        assert_eq!(log.partition_count(), 1);
        assert_eq!(log.size(), 3);
        assert_eq!(messages(&log.all()), ["a", "b", "c"]);
    }

    #[test]
    fn test_retention_law_holds_after_every_append() {
        let (log, clock) = structure(250, 0);
        for i in 0..200u64 {
            clock.advance(Duration::from_millis(i % 7 * 10));
            let latest = log.append(LogLevel::Debug, format!("tick {}", i));
            let oldest = log.iter().next().unwrap();
            assert!(latest.created_at_millis() - oldest.created_at_millis() <= 250);
        }
    }

    #[test]
    fn test_range_inclusive() {
        let (log, clock) = structure(10_000, 1_000);
        log.append(LogLevel::Info, "a");
        clock.set_millis(2_000);
        log.append(LogLevel::Info, "b");
        clock.set_millis(3_000);
        log.append(LogLevel::Info, "c");

        assert_eq!(messages(&log.range(1_000, 2_000)), ["a", "b"]);
        assert_eq!(messages(&log.range(2_000, 2_000)), ["b"]);
        assert_eq!(messages(&log.range(0, i64::MAX)), ["a", "b", "c"]);
    }

    #[test]
    fn test_range_empty_cases() {
        let (log, _clock) = structure(10_000, 5_000);
        assert!(log.range(0, 10_000).is_empty());

        log.append(LogLevel::Info, "a");
        assert!(log.range(6_000, 7_000).is_empty());
        assert!(log.range(7_000, 1_000).is_empty());
    }

    #[test]
    fn test_iter_orders_across_partitions() {
        let (log, clock) = structure(10_000, 0);
        log.append(LogLevel::Info, "a");
        log.append(LogLevel::Info, "b");
        clock.advance(Duration::from_millis(5));
        log.append(LogLevel::Info, "c");

        let seen: Vec<String> = log.iter().map(|e| e.message().to_string()).collect();
        assert_eq!(seen, ["a", "b", "c"]);

        // restartable
        let again: Vec<String> = (&log).into_iter().map(|e| e.message().to_string()).collect();
        assert_eq!(again, seen);
    }

    #[test]
    fn test_iter_survives_eviction_mid_traversal() {
        let (log, clock) = structure(100, 0);
        log.append(LogLevel::Info, "a");
        clock.advance(Duration::from_millis(10));
        log.append(LogLevel::Info, "b");

        let mut iter = log.iter();
        assert_eq!(iter.next().unwrap().message(), "a");

        clock.advance(Duration::from_millis(500));
        log.append(LogLevel::Info, "c");

        let rest: Vec<String> = iter.map(|e| e.message().to_string()).collect();
        assert_eq!(rest, ["c"]);
    }

    #[test]
    fn test_iter_sees_entries_appended_to_current_partition() {
        let (log, _clock) = structure(1_000, 0);
        log.append(LogLevel::Info, "a");

        let mut iter = log.iter();
        assert_eq!(iter.next().unwrap().message(), "a");
        log.append(LogLevel::Info, "b");
        assert_eq!(iter.next().unwrap().message(), "b");
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_clock_going_backwards_preserves_order() {
        let (log, clock) = structure(1_000, 5_000);
        log.append(LogLevel::Info, "first");
        clock.set_millis(4_000);
        log.append(LogLevel::Info, "second");

        assert_eq!(messages(&log.all()), ["first", "second"]);
        assert_eq!(log.all()[1].created_at_millis(), 5_000);
    }

    #[test]
    fn test_slice_through_store_trait() {
        let (log, clock) = structure(10_000, 0);
        for msg in ["a", "b", "c"] {
            log.append(LogLevel::Info, msg);
            clock.advance(Duration::from_millis(1));
        }
        let store: &dyn LogStore = &log;
        assert_eq!(messages(&store.slice(1, 5)), ["b", "c"]);
        assert!(store.slice(3, 1).is_empty());
    }

    #[test]
    fn test_concurrent_appends_keep_per_thread_order() {
        let log = Arc::new(TemporalLogStructure::new(Duration::from_secs(60)).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for i in 0..250 {
                        log.append(LogLevel::Debug, format!("{}:{}", t, i));
                    }
                })
            })
            .collect();

        let reader = {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                for _ in 0..50 {
                    let count = log.iter().count();
                    assert!(count <= 1_000);
                }
            })
        };

        for handle in handles {
            handle.join().unwrap();
        }
        reader.join().unwrap();

        let entries = log.all();
        assert_eq!(entries.len(), 1_000);
        assert_eq!(log.size(), 1_000);

        let mut next_expected = [0usize; 4];
        for entry in &entries {
            let (t, i) = entry.message().split_once(':').unwrap();
            let (t, i): (usize, usize) = (t.parse().unwrap(), i.parse().unwrap());
            assert_eq!(i, next_expected[t]);
            next_expected[t] += 1;
        }
        for pair in entries.windows(2) {
            assert!(pair[0].created_at() <= pair[1].created_at());
        }
    }
}
