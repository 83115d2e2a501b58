//! Error types for the log core

use thiserror::Error;

/// Errors raised by log stores and sources
///
/// Only construction can fail. Appends, reads and listener management are infallible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
    /// A capacity or retention parameter was zero or out of range
    #[error("invalid log configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result alias for log core operations
pub type Result<T> = std::result::Result<T, LogError>;
