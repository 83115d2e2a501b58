//! Change listeners and their registry
//!
//! Listeners are held strongly until explicitly unregistered, either through
//! [`ListenerRegistry::unregister`] or by dropping a [`Subscription`].

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock, Weak};

use uuid::Uuid;

use super::store::{read_lock, write_lock};

/// Observer told that the log changed and should be re-read
pub trait LogChangeListener: Send + Sync {
    fn on_log_changed(&self);
}

impl<F> LogChangeListener for F
where
    F: Fn() + Send + Sync,
{
    fn on_log_changed(&self) {
        self()
    }
}

/// Opaque handle identifying a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Thread-safe set of listeners keyed by subscription
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<HashMap<SubscriptionId, Arc<dyn LogChangeListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: Arc<dyn LogChangeListener>) -> SubscriptionId {
        let id = SubscriptionId::new();
        write_lock(&self.listeners).insert(id, listener);
        tracing::trace!(subscription = %id, "Registered log listener");
        id
    }

    /// Remove a listener. Unknown or already-removed ids are ignored.
    ///
    /// Returns whether a listener was removed.
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        let removed = write_lock(&self.listeners).remove(&id).is_some();
        if removed {
            tracing::trace!(subscription = %id, "Unregistered log listener");
        }
        removed
    }

    pub fn len(&self) -> usize {
        read_lock(&self.listeners).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Listeners registered right now, for a later [`notify`](Self::notify)
    pub fn snapshot(&self) -> ListenerSnapshot {
        let listeners = read_lock(&self.listeners)
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect();
        ListenerSnapshot { listeners }
    }

    /// Notify every listener registered at the time of the call
    pub fn notify_all(&self) -> usize {
        self.notify(self.snapshot())
    }

    /// Notify the listeners captured in `snapshot`
    ///
    /// Listeners registered after the snapshot are not called, and neither are
    /// listeners unregistered since. No registry lock is held while a callback runs,
    /// so callbacks may register or unregister listeners. A panicking listener is
    /// reported and skipped. Returns the number of listeners that completed without
    /// panicking.
    pub fn notify(&self, snapshot: ListenerSnapshot) -> usize {
        let mut delivered = 0;
        for (id, listener) in snapshot.listeners {
            if !read_lock(&self.listeners).contains_key(&id) {
                continue;
            }
            match panic::catch_unwind(AssertUnwindSafe(|| listener.on_log_changed())) {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    tracing::warn!(
                        subscription = %id,
                        "Log listener panicked: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        delivered
    }
}

/// Listeners captured by [`ListenerRegistry::snapshot`]
pub struct ListenerSnapshot {
    listeners: Vec<(SubscriptionId, Arc<dyn LogChangeListener>)>,
}

impl ListenerSnapshot {
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for ListenerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.listeners.iter().map(|(id, _)| id))
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "<non-string panic payload>"
    }
}

/// Scoped registration that unregisters its listener when dropped
#[must_use = "dropping a Subscription unregisters the listener immediately"]
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<ListenerRegistry>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, registry: &Arc<ListenerRegistry>) -> Self {
        Self {
            id,
            registry: Arc::downgrade(registry),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
