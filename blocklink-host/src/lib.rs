//! Host side of the Blocklink serial bridge
//!
//! - [`bridge::Bridge`] - sends broadcasts/commands and polls for frames
//! - [`serial`] - `serialport`-backed transport
//! - [`config`] - bridge configuration file
//! - [`error`] - host error types

pub mod bridge;
pub mod config;
pub mod error;
pub mod serial;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use error::{BridgeError, ConfigError};
pub use serial::{SerialConnector, SerialError, SerialTransport};
