use std::path::Path;
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::serial::accumulator::RESPONSE_CAPACITY;
use crate::serial::interface::BAUD_RATE;
use crate::station::FirmwareQuery;

pub const WAKE_ATTEMPTS: u32 = 3;
pub const WAKE_SETTLE_MS: u64 = 200;
pub const REPLY_SETTLE_MS: u64 = 1500;
pub const REPLY_TIMEOUT_MS: u64 = 5000;
pub const QUIET_WINDOW_MS: u64 = 100;
pub const MAX_DRAIN_ROUNDS: u32 = 64;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tunables of a console session.
///
/// Which firmware query form and model offset a console accepts depends on
/// its firmware generation; neither default is right for every station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub baud_rate: u32,
    pub wake_attempts: u32,
    pub wake_settle_ms: u64,
    /// Wait between the first readiness signal and the first drain
    pub reply_settle_ms: u64,
    /// Bound on waiting for the console to start answering
    pub reply_timeout_ms: u64,
    /// Silence after a drain that marks the end of a reply
    pub quiet_window_ms: u64,
    pub max_drain_rounds: u32,
    pub response_capacity: usize,
    pub firmware_query: FirmwareQuery,
    /// Byte offset of the model code within the model reply
    pub model_offset: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            baud_rate: BAUD_RATE,
            wake_attempts: WAKE_ATTEMPTS,
            wake_settle_ms: WAKE_SETTLE_MS,
            reply_settle_ms: REPLY_SETTLE_MS,
            reply_timeout_ms: REPLY_TIMEOUT_MS,
            quiet_window_ms: QUIET_WINDOW_MS,
            max_drain_rounds: MAX_DRAIN_ROUNDS,
            response_capacity: RESPONSE_CAPACITY,
            firmware_query: FirmwareQuery::default(),
            model_offset: 0,
        }
    }
}

impl SessionConfig {
    /// Load a JSON config file; missing fields keep their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: SessionConfig = serde_json::from_str(&text)?;
        config.validate()?;
        log::debug!("Loaded session config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.baud_rate == 0 {
            return Err(ConfigError::Invalid("baud_rate must be non-zero".to_string()));
        }
        if self.wake_attempts == 0 {
            return Err(ConfigError::Invalid("wake_attempts must be at least 1".to_string()));
        }
        if self.response_capacity == 0 {
            return Err(ConfigError::Invalid("response_capacity must be non-zero".to_string()));
        }
        if self.max_drain_rounds == 0 {
            return Err(ConfigError::Invalid("max_drain_rounds must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn wake_settle(&self) -> Duration {
        Duration::from_millis(self.wake_settle_ms)
    }

    pub fn reply_settle(&self) -> Duration {
        Duration::from_millis(self.reply_settle_ms)
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }

    pub fn quiet_window(&self) -> Duration {
        Duration::from_millis(self.quiet_window_ms)
    }
}
