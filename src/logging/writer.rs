//! Tracing subscriber setup with log source integration
//!
//! Sets up `tracing` output on stderr and mirrors every formatted event into a
//! [`LogWindowSource`], so the application's own diagnostics show up in the observed log.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::log::{LogLevel, LogWindowSource};

/// Events from the log core itself are never mirrored, so a failing listener
/// cannot trigger its own notification again.
const CORE_TARGET: &str = "simlog::log";

fn is_core_target(target: &str) -> bool {
    target
        .strip_prefix(CORE_TARGET)
        .map_or(false, |rest| rest.is_empty() || rest.starts_with("::"))
}

/// A writer that appends each formatted event to a log source
pub struct SourceWriter {
    source: Arc<LogWindowSource>,
}

impl Write for SourceWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let line = String::from_utf8_lossy(buf);
        if let Some((level, message)) = parse_log_line(&line) {
            self.source.append(level, message);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Writer factory for tracing-subscriber
pub struct SourceWriterMaker {
    source: Arc<LogWindowSource>,
}

impl SourceWriterMaker {
    pub fn new(source: Arc<LogWindowSource>) -> Self {
        Self { source }
    }
}

impl<'a> MakeWriter<'a> for SourceWriterMaker {
    type Writer = SourceWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SourceWriter {
            source: Arc::clone(&self.source),
        }
    }
}

/// Parse a formatted line into a level and message
///
/// Expects the fmt layer's plain layout: `<timestamp> <LEVEL> <target>: <message>`.
/// Lines that do not match are kept whole at Info level.
pub fn parse_log_line(line: &str) -> Option<(LogLevel, String)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let parsed = line.split_once(' ').and_then(|(_timestamp, rest)| {
        let (token, rest) = rest.trim_start().split_once(' ')?;
        let level = parse_level(token)?;
        let message = match rest.split_once(": ") {
            Some((target, message)) if !target.contains(' ') => message,
            _ => rest,
        };
        Some((level, message.trim().to_string()))
    });

    Some(parsed.unwrap_or_else(|| (LogLevel::Info, line.to_string())))
}

fn parse_level(token: &str) -> Option<LogLevel> {
    match token {
        "TRACE" => Some(LogLevel::Trace),
        "DEBUG" => Some(LogLevel::Debug),
        "INFO" => Some(LogLevel::Info),
        "WARN" => Some(LogLevel::Warning),
        "ERROR" => Some(LogLevel::Error),
        _ => None,
    }
}

/// Initialize tracing with stderr output mirrored into `source`
///
/// `default_filter` applies when `RUST_LOG` is unset.
pub fn init_tracing(source: Arc<LogWindowSource>, default_filter: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let source_layer = tracing_subscriber::fmt::layer()
        .with_writer(SourceWriterMaker::new(source))
        .with_ansi(false)
        .with_target(true)
        .with_filter(filter_fn(|metadata| !is_core_target(metadata.target())));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(source_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_line_info() {
        let line = "2026-01-21T14:30:45.123456Z  INFO simlog: Starting simulation";
        let (level, message) = parse_log_line(line).unwrap();
        assert_eq!(level, LogLevel::Info);
        assert_eq!(message, "Starting simulation");
    }

    #[test]
    fn test_parse_log_line_warn() {
        let line = "2026-01-21T14:30:45.123456Z  WARN simlog::config: Config not found";
        let (level, message) = parse_log_line(line).unwrap();
        assert_eq!(level, LogLevel::Warning);
        assert_eq!(message, "Config not found");
    }

    #[test]
    fn test_parse_log_line_error() {
        let line = "2026-01-21T14:30:45.123456Z ERROR simlog::sim: Robot left the field";
        let (level, message) = parse_log_line(line).unwrap();
        assert_eq!(level, LogLevel::Error);
        assert_eq!(message, "Robot left the field");
    }

    #[test]
    fn test_parse_log_line_level_word_in_message() {
        let line = "2026-01-21T14:30:45.123456Z DEBUG simlog::sim: no ERROR here";
        let (level, message) = parse_log_line(line).unwrap();
        assert_eq!(level, LogLevel::Debug);
        assert_eq!(message, "no ERROR here");
    }

    #[test]
    fn test_parse_log_line_unstructured() {
        let (level, message) = parse_log_line("plain text").unwrap();
        assert_eq!(level, LogLevel::Info);
        assert_eq!(message, "plain text");
        assert!(parse_log_line("   \n").is_none());
    }

    #[test]
    fn test_core_target_matches_whole_module_path() {
        assert!(is_core_target("simlog::log"));
        assert!(is_core_target("simlog::log::listener"));
        assert!(!is_core_target("simlog::logging"));
        assert!(!is_core_target("simlog::logging::writer"));
        assert!(!is_core_target("simlog"));
    }

    #[test]
    fn test_source_writer_appends_entries() {
        let source = Arc::new(LogWindowSource::new(10).unwrap());
        let maker = SourceWriterMaker::new(Arc::clone(&source));

        let mut writer = maker.make_writer();
        writer
            .write_all(b"2026-01-21T14:30:45.123456Z  WARN simlog::sim: Low battery\n")
            .unwrap();
        writer.write_all(b"\n").unwrap();

        let entries = source.all();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level(), LogLevel::Warning);
        assert_eq!(entries[0].message(), "Low battery");
    }
}
