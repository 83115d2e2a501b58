//! Observable log source
//!
//! Couples a [`LogStore`] with a [`ListenerRegistry`]: every append is committed to the
//! store and then announced to the listeners that were registered when the append began.

use std::sync::Arc;
use std::time::Duration;

use super::buffer::BoundedLogBuffer;
use super::entry::LogEntry;
use super::level::LogLevel;
use super::listener::{ListenerRegistry, LogChangeListener, Subscription, SubscriptionId};
use super::store::LogStore;
use super::temporal::TemporalLogStructure;
use crate::error::Result;

/// A log that notifies listeners on every append
pub struct LogWindowSource {
    store: Arc<dyn LogStore>,
    listeners: Arc<ListenerRegistry>,
}

impl LogWindowSource {
    /// Source keeping the most recent `queue_length` entries
    pub fn new(queue_length: usize) -> Result<Self> {
        let store = BoundedLogBuffer::new(queue_length)?;
        Ok(Self::with_store(Arc::new(store)))
    }

    /// Source keeping entries for the given retention window
    pub fn with_retention(retention: Duration) -> Result<Self> {
        let store = TemporalLogStructure::new(retention)?;
        Ok(Self::with_store(Arc::new(store)))
    }

    pub fn with_store(store: Arc<dyn LogStore>) -> Self {
        Self {
            store,
            listeners: Arc::new(ListenerRegistry::new()),
        }
    }

    /// Append an entry and notify the listeners registered when the call began
    ///
    /// A listener registered while the append is in flight is not told about it.
    /// The entry is visible to [`all`](Self::all) before any listener runs. Listener
    /// panics are contained and never reach the caller.
    pub fn append(&self, level: LogLevel, message: impl Into<String>) -> LogEntry {
        let listeners = self.listeners.snapshot();
        let entry = self.store.append(level, message.into());
        self.listeners.notify(listeners);
        entry
    }

    /// Snapshot of all entries, oldest first
    pub fn all(&self) -> Vec<LogEntry> {
        self.store.all()
    }

    pub fn size(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Up to `count` entries starting at index `start_from`
    ///
    /// Indices count from the oldest live entry. An out-of-range start yields an
    /// empty vector.
    pub fn range(&self, start_from: usize, count: usize) -> Vec<LogEntry> {
        self.store.slice(start_from, count)
    }

    /// Register a listener for future appends
    ///
    /// The listener stays registered until [`unregister_listener`](Self::unregister_listener)
    /// is called with the returned id.
    pub fn register_listener(&self, listener: Arc<dyn LogChangeListener>) -> SubscriptionId {
        self.listeners.register(listener)
    }

    /// Stop notifying a listener. Unknown ids are ignored.
    pub fn unregister_listener(&self, id: SubscriptionId) {
        self.listeners.unregister(id);
    }

    /// Register a listener for as long as the returned guard lives
    pub fn subscribe(&self, listener: Arc<dyn LogChangeListener>) -> Subscription {
        let id = self.listeners.register(listener);
        Subscription::new(id, &self.listeners)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
