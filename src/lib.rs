//! simlog - bounded, time-aware log storage for simulation viewers
//!
//! This library provides the log core shared by simulation code that emits entries
//! and viewer windows that re-read the log whenever it changes.

pub mod config;
pub mod error;
pub mod log;
pub mod logging;

pub use error::LogError;
