//! Diagnostics for simlog
//!
//! Routes the application's `tracing` output to stderr and into a log source for
//! real-time viewing.

mod writer;

pub use writer::{init_tracing, parse_log_line, SourceWriter, SourceWriterMaker};
