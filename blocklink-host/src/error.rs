//! Error types for the host bridge

use std::path::PathBuf;

use blocklink_protocol::FrameError;
use thiserror::Error;

use crate::serial::SerialError;

/// Errors from bridge operations
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The underlying transport failed to read or write
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The serial port could not be opened
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: SerialError,
    },

    /// A message could not be encoded
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// No port given on the command line or in the config file
    #[error("no serial port configured (use --port or set `port` in the config file)")]
    NoPort,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BridgeError {
    /// Wrap a transport-level error
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        BridgeError::Transport(Box::new(err))
    }
}

/// Errors from loading the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(&'static str),
}
