//! In-memory log core
//!
//! Provides bounded and time-partitioned log stores, an observable source that
//! notifies listeners on each append, and the logging entry points used by
//! simulation code.

mod buffer;
mod clock;
mod entry;
mod level;
mod listener;
mod logger;
mod source;
mod store;
mod temporal;

pub use buffer::BoundedLogBuffer;
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::LogEntry;
pub use level::LogLevel;
pub use listener::{
    ListenerRegistry, ListenerSnapshot, LogChangeListener, Subscription, SubscriptionId,
};
pub use logger::{debug, default_log_source, error, LogSink, Logger, DEFAULT_QUEUE_LENGTH};
pub use source::LogWindowSource;
pub use store::LogStore;
pub use temporal::{TemporalLogIter, TemporalLogStructure};
