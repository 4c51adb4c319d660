//! Frame encoding and decoding.
//!
//! Short frame:
//! - START (1 byte): 0xFA
//! - TYPE (1 byte): message type identifier
//! - PARAM (1 byte): chunk/variable index or command argument
//!
//! Long frame:
//! - START (1 byte): 0xFB
//! - TYPE (1 byte): message type identifier
//! - PARAM (1 byte): chunk/variable index, zero when unused
//! - LENGTH (2 bytes, little-endian): payload length + 1 for the terminator
//! - PAYLOAD (LENGTH - 1 bytes): type-specific data
//! - TERMINATOR (1 byte): 0xFE
//!
//! The board writes its own long frames with LENGTH equal to the data size
//! and no terminator, so the last data byte sits where the terminator would
//! be. [`LongFrame::body`] gives back the full data for either shape.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::messages::MSG_BROADCAST;

/// Start byte of a 3-byte short frame
pub const SHORT_FRAME_START: u8 = 0xFA;

/// Start byte of a variable-length long frame
pub const LONG_FRAME_START: u8 = 0xFB;

/// Last byte of every long frame
pub const FRAME_TERMINATOR: u8 = 0xFE;

/// Size of a short frame
pub const SHORT_FRAME_LEN: usize = 3;

/// Size of a long frame header (START + TYPE + PARAM + LENGTH)
pub const LONG_HEADER_LEN: usize = 5;

/// Largest payload whose length field (payload + terminator) still fits in 16 bits
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize - 1;

/// Errors that can occur while encoding frames or decoding their contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds the 16-bit length field
    PayloadTooLarge,
    /// Frame has the wrong shape for the requested decoding
    InvalidFrame,
    /// Frame carries a different message type than expected
    UnexpectedType(u8),
    /// Text payload is not valid UTF-8
    InvalidUtf8,
    /// Value payload has an unknown type tag or is truncated
    InvalidValue,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::PayloadTooLarge => {
                write!(f, "payload exceeds {} bytes", MAX_PAYLOAD_SIZE)
            }
            FrameError::InvalidFrame => f.write_str("invalid frame"),
            FrameError::UnexpectedType(t) => write!(f, "unexpected message type {}", t),
            FrameError::InvalidUtf8 => f.write_str("payload is not valid UTF-8"),
            FrameError::InvalidValue => f.write_str("invalid value payload"),
        }
    }
}

impl core::error::Error for FrameError {}

/// A 3-byte frame with no payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShortFrame {
    /// Message type identifier
    pub msg_type: u8,
    /// Parameter byte
    pub param: u8,
}

/// A variable-length frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongFrame {
    /// Message type identifier
    pub msg_type: u8,
    /// Parameter byte (zero when the message kind does not use it)
    pub param: u8,
    /// Payload data, terminator position excluded
    pub payload: Vec<u8>,
    /// Byte found at the terminator position, `None` for a zero LENGTH
    pub trailer: Option<u8>,
}

impl LongFrame {
    /// Create a new long frame with the given type, parameter and payload
    pub fn new(msg_type: u8, param: u8, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge);
        }
        Ok(Self {
            msg_type,
            param,
            payload: payload.to_vec(),
            trailer: Some(FRAME_TERMINATOR),
        })
    }

    /// Returns true if the frame ended with the terminator byte
    pub fn terminated(&self) -> bool {
        self.trailer == Some(FRAME_TERMINATOR)
    }

    /// Message data: the payload, plus the trailing byte when it is not a
    /// terminator
    pub fn body(&self) -> Cow<'_, [u8]> {
        match self.trailer {
            Some(byte) if byte != FRAME_TERMINATOR => {
                let mut body = Vec::with_capacity(self.payload.len() + 1);
                body.extend_from_slice(&self.payload);
                body.push(byte);
                Cow::Owned(body)
            }
            _ => Cow::Borrowed(&self.payload),
        }
    }

    /// Value of the LENGTH field for this frame
    fn length_field(&self) -> u16 {
        // Bounded by MAX_PAYLOAD_SIZE at construction; parsed frames come
        // from a 16-bit field.
        (self.payload.len() + 1) as u16
    }

    /// Decode the body as UTF-8 text
    pub fn text(&self) -> Result<String, FrameError> {
        core::str::from_utf8(&self.body())
            .map(String::from)
            .map_err(|_| FrameError::InvalidUtf8)
    }

    /// Build a long frame from a complete wire slice
    ///
    /// The slice must start with `LONG_FRAME_START` and be exactly
    /// `5 + LENGTH` bytes long. A zero LENGTH yields an empty frame with
    /// no trailer.
    pub(crate) fn from_wire(bytes: &[u8]) -> Self {
        let length = u16::from_le_bytes([bytes[3], bytes[4]]) as usize;
        let (payload, trailer) = if length == 0 {
            (Vec::new(), None)
        } else {
            let end = LONG_HEADER_LEN + length - 1;
            (bytes[LONG_HEADER_LEN..end].to_vec(), Some(bytes[end]))
        };
        Self {
            msg_type: bytes[1],
            param: bytes[2],
            payload,
            trailer,
        }
    }
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Short(ShortFrame),
    Long(LongFrame),
}

impl Frame {
    /// Create a short frame
    pub fn short(msg_type: u8, param: u8) -> Self {
        Frame::Short(ShortFrame { msg_type, param })
    }

    /// Create a long frame
    pub fn long(msg_type: u8, param: u8, payload: &[u8]) -> Result<Self, FrameError> {
        LongFrame::new(msg_type, param, payload).map(Frame::Long)
    }

    /// Message type identifier
    pub fn msg_type(&self) -> u8 {
        match self {
            Frame::Short(f) => f.msg_type,
            Frame::Long(f) => f.msg_type,
        }
    }

    /// Parameter byte
    pub fn param(&self) -> u8 {
        match self {
            Frame::Short(f) => f.param,
            Frame::Long(f) => f.param,
        }
    }

    /// Payload bytes (empty for short frames)
    pub fn payload(&self) -> &[u8] {
        match self {
            Frame::Short(_) => &[],
            Frame::Long(f) => &f.payload,
        }
    }

    /// Number of bytes this frame occupies on the wire
    pub fn encoded_len(&self) -> usize {
        match self {
            Frame::Short(_) => SHORT_FRAME_LEN,
            Frame::Long(f) => LONG_HEADER_LEN + f.payload.len() + 1,
        }
    }

    /// Encode this frame into a byte vector
    ///
    /// Long frames are always written with a terminator after the payload.
    /// A parsed unterminated frame is re-encoded from its payload alone; use
    /// [`LongFrame::body`] to keep the trailing byte.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Frame::Short(f) => encode_short(f.msg_type, f.param).to_vec(),
            Frame::Long(f) => {
                let mut out = Vec::with_capacity(self.encoded_len());
                write_long(&mut out, f.msg_type, f.param, f.length_field(), &f.payload);
                out
            }
        }
    }
}

fn write_long(out: &mut Vec<u8>, msg_type: u8, param: u8, length: u16, payload: &[u8]) {
    let [lo, hi] = length.to_le_bytes();
    out.extend_from_slice(&[LONG_FRAME_START, msg_type, param, lo, hi]);
    out.extend_from_slice(payload);
    out.push(FRAME_TERMINATOR);
}

/// Encode a short frame
pub fn encode_short(msg_type: u8, param: u8) -> [u8; SHORT_FRAME_LEN] {
    [SHORT_FRAME_START, msg_type, param]
}

/// Encode a long frame directly from its parts
pub fn encode_long(msg_type: u8, param: u8, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(FrameError::PayloadTooLarge);
    }
    let mut out = Vec::with_capacity(LONG_HEADER_LEN + payload.len() + 1);
    write_long(&mut out, msg_type, param, (payload.len() + 1) as u16, payload);
    Ok(out)
}

/// Encode a broadcast message
///
/// `encode_broadcast("happy")` yields
/// `[251, 27, 0, 6, 0, b'h', b'a', b'p', b'p', b'y', 254]`.
pub fn encode_broadcast(text: &str) -> Result<Vec<u8>, FrameError> {
    encode_long(MSG_BROADCAST, 0, text.as_bytes())
}

/// Decode the text of a broadcast frame
pub fn decode_broadcast(frame: &Frame) -> Result<String, FrameError> {
    match frame {
        Frame::Long(f) if f.msg_type == MSG_BROADCAST => f.text(),
        Frame::Long(f) => Err(FrameError::UnexpectedType(f.msg_type)),
        Frame::Short(_) => Err(FrameError::InvalidFrame),
    }
}
