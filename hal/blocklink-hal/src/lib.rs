//! Blocklink Transport Abstraction Layer
//!
//! This crate defines the traits a byte transport must implement so the
//! host bridge can talk to a board without knowing how the bytes travel
//! (USB CDC serial, a hardware UART, a pipe to a simulator, ...).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (blocklink-host bridge)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  blocklink-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ serialport    │       │ loopback      │
//! │ (host crate)  │       │ (this crate)  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`transport::Transport`] - Non-blocking duplex byte stream
//! - [`transport::Connector`] - Opens and closes transports by identifier

#![no_std]
#![deny(unsafe_code)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
pub mod loopback;
pub mod transport;

// Re-export key traits at crate root for convenience
#[cfg(feature = "alloc")]
pub use loopback::{Loopback, LoopbackConnector, LoopbackError};
pub use transport::{Connector, DataBits, Parity, SerialConfig, StopBits, Transport};
