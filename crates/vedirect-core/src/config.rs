//! Reader configuration
//!
//! Tunable scan budgets and timing. Defaults match a VE.Direct device sending
//! one frame per second at 19200 baud.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::protocol::{
    DEFAULT_LINE_CAPACITY, DEFAULT_MAX_READ_LINES, DEFAULT_MAX_READ_LOOPS,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_SETTLE_DELAY_MS, DEFAULT_TIMEOUT_MS, MAX_LINE_CAPACITY,
    VED_BAUD_RATE,
};

/// Errors loading or validating a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Protocol reader configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Link speed applied by `open()`
    pub baud_rate: u32,
    /// Maximum bytes in one line
    pub line_capacity: usize,
    /// Raw byte-read attempts allowed per line
    pub max_read_loops: u32,
    /// Non-matching lines scanned before giving up
    pub max_read_lines: u32,
    /// Liveness timeout in milliseconds
    pub timeout_ms: u64,
    /// Wait after configuring the link before probing it
    pub settle_delay_ms: u64,
    /// Sleep between polls while no bytes are pending
    pub poll_interval_ms: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            baud_rate: VED_BAUD_RATE,
            line_capacity: DEFAULT_LINE_CAPACITY,
            max_read_loops: DEFAULT_MAX_READ_LOOPS,
            max_read_lines: DEFAULT_MAX_READ_LINES,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl ReaderConfig {
    /// Liveness timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Settle delay used by the connection probe
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Idle poll interval
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reject budgets that would make every read fail immediately, and line
    /// buffers larger than `MAX_LINE_CAPACITY`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.baud_rate == 0 {
            return Err(ConfigError::Invalid("baud_rate must be non-zero".into()));
        }
        if self.line_capacity == 0 {
            return Err(ConfigError::Invalid("line_capacity must be non-zero".into()));
        }
        if self.line_capacity > MAX_LINE_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "line_capacity {} exceeds {} bytes",
                self.line_capacity, MAX_LINE_CAPACITY
            )));
        }
        if self.max_read_loops == 0 {
            return Err(ConfigError::Invalid("max_read_loops must be non-zero".into()));
        }
        if self.max_read_lines == 0 {
            return Err(ConfigError::Invalid("max_read_lines must be non-zero".into()));
        }
        Ok(())
    }

    /// Load and validate a JSON config file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: ReaderConfig = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.as_ref().display(), ?config, "loaded reader config");
        Ok(config)
    }

    /// Write the config as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
