//! Blocklink Serial Protocol
//!
//! This crate defines the byte-level protocol spoken between a host process
//! and a microcontroller running a blocks interpreter. Both sides exchange
//! small framed messages over a UART/USB-serial link; the most common one
//! is the *broadcast*, a named event used for signaling in either direction.
//!
//! # Protocol Overview
//!
//! There are two frame shapes, distinguished by their start byte:
//! ```text
//! Short frame (3 bytes)
//! ┌───────┬──────┬───────┐
//! │ 0xFA  │ TYPE │ PARAM │
//! └───────┴──────┴───────┘
//!
//! Long frame (5 + LENGTH bytes)
//! ┌───────┬──────┬───────┬──────────────┬──────────────────┬──────┐
//! │ 0xFB  │ TYPE │ PARAM │ LENGTH (LE)  │ PAYLOAD          │ 0xFE │
//! │ 1B    │ 1B   │ 1B    │ 2B           │ LENGTH - 1 bytes │ 1B   │
//! └───────┴──────┴───────┴──────────────┴──────────────────┴──────┘
//! ```
//!
//! The stream has no checksum and no sequence numbers. The receiver
//! resynchronizes after noise by skipping to the next start byte, see
//! [`StreamParser`].

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

pub mod frame;
pub mod messages;
pub mod parser;
pub mod value;

pub use frame::{
    decode_broadcast, encode_broadcast, encode_long, encode_short, Frame, FrameError, LongFrame,
    ShortFrame, FRAME_TERMINATOR, LONG_FRAME_START, MAX_PAYLOAD_SIZE, SHORT_FRAME_START,
};
pub use messages::{DeviceMessage, HostCommand, MessageType, MSG_BROADCAST};
pub use parser::{Filter, StreamParser};
pub use value::Value;
