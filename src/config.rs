//! Configuration management for simlog

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::LogError;
use crate::log::{LogLevel, LogWindowSource, DEFAULT_QUEUE_LENGTH};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Maximum entries kept by a count-bounded log (default: 100)
    #[serde(default = "default_queue_length")]
    pub queue_length: usize,

    /// Retention window in milliseconds. When set, the log is time-partitioned
    /// and `queue_length` is ignored.
    #[serde(default)]
    pub retention_ms: Option<u64>,

    /// Simulation tick interval in milliseconds (default: 50)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Number of ticks the demo simulation runs (default: 100)
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// Fallback tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Lowest level the demo viewer displays (default: debug)
    #[serde(default = "default_viewer_level")]
    pub viewer_level: LogLevel,
}

fn default_queue_length() -> usize {
    DEFAULT_QUEUE_LENGTH
}

fn default_tick_interval_ms() -> u64 {
    50
}

fn default_ticks() -> u64 {
    100
}

fn default_log_filter() -> String {
    "simlog=info".to_string()
}

fn default_viewer_level() -> LogLevel {
    LogLevel::Debug
}

impl Default for Config {
    fn default() -> Self {
        Self {
            queue_length: default_queue_length(),
            retention_ms: None,
            tick_interval_ms: default_tick_interval_ms(),
            ticks: default_ticks(),
            log_filter: default_log_filter(),
            viewer_level: default_viewer_level(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific file, or return default if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            let config: Self = toml::from_str(&content).context("Failed to parse config file")?;
            config.validate().context("Invalid config file")?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Check the log parameters before anything is built from them
    pub fn validate(&self) -> std::result::Result<(), LogError> {
        if self.queue_length == 0 {
            return Err(LogError::InvalidConfiguration(
                "queue_length must be greater than zero".to_string(),
            ));
        }
        if self.retention_ms == Some(0) {
            return Err(LogError::InvalidConfiguration(
                "retention_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn retention(&self) -> Option<Duration> {
        self.retention_ms.map(Duration::from_millis)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Build the log source described by this configuration
    pub fn build_source(&self) -> std::result::Result<LogWindowSource, LogError> {
        self.validate()?;
        match self.retention() {
            Some(retention) => LogWindowSource::with_retention(retention),
            None => LogWindowSource::new(self.queue_length),
        }
    }
}

/// Get the base configuration directory (~/.simlog)
/// Falls back to ./.simlog if home directory cannot be determined
pub fn config_dir() -> PathBuf {
    try_config_dir().unwrap_or_else(|| {
        tracing::warn!("Could not determine home directory, using current directory for config");
        PathBuf::from(".simlog")
    })
}

/// Try to get the base configuration directory, returning None if home dir is unavailable
pub fn try_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".simlog"))
}

/// Get the path to the config file
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
