//! Bridge configuration
//!
//! Optional TOML file; every key has a default so an empty file (or no
//! file at all) is valid:
//!
//! ```toml
//! port = "/dev/ttyACM0"
//! baudrate = 115200
//! poll_interval_ms = 10
//! read_chunk = 256
//! ```

use std::path::Path;
use std::time::Duration;

use blocklink_hal::SerialConfig;
use serde::Deserialize;

use crate::bridge::DEFAULT_READ_CHUNK;
use crate::error::ConfigError;

/// Baud rate the board firmware listens at
pub const DEFAULT_BAUDRATE: u32 = 115200;

/// Delay between polls in the listen loop
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Serial device path or port name
    pub port: Option<String>,
    /// Line speed in bits per second
    pub baudrate: u32,
    /// Delay between polls in the listen loop, in milliseconds
    pub poll_interval_ms: u64,
    /// Bytes requested per non-blocking read
    pub read_chunk: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: None,
            baudrate: DEFAULT_BAUDRATE,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            read_chunk: DEFAULT_READ_CHUNK,
        }
    }
}

impl BridgeConfig {
    /// Parse a config from TOML text
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.baudrate == 0 {
            return Err(ConfigError::Invalid("baudrate must be non-zero"));
        }
        if self.read_chunk == 0 {
            return Err(ConfigError::Invalid("read_chunk must be non-zero"));
        }
        Ok(())
    }

    /// Serial line settings (8N1 at the configured baud rate)
    pub fn serial(&self) -> SerialConfig {
        SerialConfig::with_baudrate(self.baudrate)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
