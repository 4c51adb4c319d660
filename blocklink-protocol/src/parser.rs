//! Incremental stream parser
//!
//! Serial reads hand over whatever bytes happen to be available, so a frame
//! may be split across several reads and one read may carry several frames.
//! [`StreamParser`] keeps the unconsumed tail of the stream between calls.
//!
//! Between calls the buffer is either empty or starts with a start byte
//! followed by an incomplete frame. Bytes in front of a start byte are noise
//! (dropped bytes, a read that began mid-frame) and are discarded.

use alloc::vec::Vec;

use crate::frame::{
    Frame, LongFrame, LONG_FRAME_START, LONG_HEADER_LEN, SHORT_FRAME_LEN, SHORT_FRAME_START,
};
use crate::messages::MessageType;

/// Selects which frames [`StreamParser::feed`] returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Filter {
    /// Return every complete frame
    #[default]
    Any,
    /// Return only frames with this message type
    ByType(u8),
}

impl Filter {
    /// Returns true if a frame of this type passes the filter
    pub fn accepts(self, msg_type: u8) -> bool {
        match self {
            Filter::Any => true,
            Filter::ByType(t) => t == msg_type,
        }
    }
}

impl From<u8> for Filter {
    fn from(msg_type: u8) -> Self {
        Filter::ByType(msg_type)
    }
}

impl From<MessageType> for Filter {
    fn from(msg_type: MessageType) -> Self {
        Filter::ByType(msg_type.to_byte())
    }
}

/// Result of looking at the buffer from a start byte
enum Scan {
    /// Not enough bytes yet
    Incomplete,
    /// A complete frame of this many bytes
    Complete(usize),
}

fn is_start(byte: u8) -> bool {
    byte == SHORT_FRAME_START || byte == LONG_FRAME_START
}

/// Measure the frame at the start of `bytes`, which begins with a start byte
fn scan(bytes: &[u8]) -> Scan {
    let needed = if bytes[0] == SHORT_FRAME_START {
        SHORT_FRAME_LEN
    } else {
        if bytes.len() < LONG_HEADER_LEN {
            return Scan::Incomplete;
        }
        let length = u16::from_le_bytes([bytes[3], bytes[4]]) as usize;
        LONG_HEADER_LEN + length
    };
    if bytes.len() < needed {
        Scan::Incomplete
    } else {
        Scan::Complete(needed)
    }
}

/// Accumulates stream bytes and extracts complete frames
#[derive(Debug, Clone, Default)]
pub struct StreamParser {
    buffer: Vec<u8>,
}

impl StreamParser {
    /// Create a parser with an empty buffer
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a parser whose buffer is preallocated for `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Bytes held back for the next call
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Append `bytes` and return every complete frame accepted by `filter`
    ///
    /// Frames are returned in stream order. Frames rejected by the filter
    /// are still consumed. An incomplete trailing frame stays buffered and
    /// is completed by later calls.
    pub fn feed(&mut self, bytes: &[u8], filter: Filter) -> Vec<Frame> {
        self.buffer.extend_from_slice(bytes);

        let mut frames = Vec::new();
        let mut pos = 0;
        loop {
            // Skip to the next start byte
            match self.buffer[pos..].iter().position(|&b| is_start(b)) {
                Some(skip) => pos += skip,
                None => {
                    pos = self.buffer.len();
                    break;
                }
            }

            let rest = &self.buffer[pos..];
            let len = match scan(rest) {
                Scan::Complete(len) => len,
                Scan::Incomplete => break,
            };

            if filter.accepts(rest[1]) {
                let frame = if rest[0] == SHORT_FRAME_START {
                    Frame::short(rest[1], rest[2])
                } else {
                    Frame::Long(LongFrame::from_wire(&rest[..len]))
                };
                frames.push(frame);
            }
            pos += len;
        }

        // Compact: drop the consumed prefix once per call
        self.buffer.drain(..pos);
        frames
    }
}
