//! Typed values carried in output, variable and task-result payloads
//!
//! The first payload byte is a type tag followed by the encoded value:
//! - 1: integer, 4 bytes little-endian
//! - 2: string, UTF-8 up to the end of the payload
//! - 3: boolean, one byte
//! - 4: list, total item count (u16 LE), sent item count (u8), tagged items
//! - 5: bytearray, total byte count (u16 LE), sent byte count (u8), bytes
//!
//! Inside a list, string items carry a one-byte length prefix, nested lists
//! and bytearrays carry only their total count, and tag 0 marks an item the
//! board cannot serialize.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::frame::FrameError;

// Wire format type tags
const VALUE_UNKNOWN: u8 = 0;
const VALUE_INTEGER: u8 = 1;
const VALUE_STRING: u8 = 2;
const VALUE_BOOLEAN: u8 = 3;
const VALUE_LIST: u8 = 4;
const VALUE_BYTEARRAY: u8 = 5;

/// A value reported by the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// 32-bit signed integer, little-endian on the wire
    Integer(i32),
    /// UTF-8 string
    Text(String),
    /// Boolean, any non-zero byte is true
    Boolean(bool),
    /// List with `total` items, of which the board sent the leading `items`
    List { total: u16, items: Vec<Value> },
    /// Byte array of `total` bytes, of which the board sent the leading `bytes`
    ByteArray { total: u16, bytes: Vec<u8> },
    /// List item of a type the board does not serialize
    Unknown,
}

/// Cursor over a value payload
struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], FrameError> {
        if self.data.len() < n {
            return Err(FrameError::InvalidValue);
        }
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8, FrameError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, FrameError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn i32(&mut self) -> Result<i32, FrameError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn rest(&mut self) -> &'a [u8] {
        core::mem::take(&mut self.data)
    }
}

fn text(bytes: &[u8]) -> Result<Value, FrameError> {
    core::str::from_utf8(bytes)
        .map(|s| Value::Text(String::from(s)))
        .map_err(|_| FrameError::InvalidUtf8)
}

impl Value {
    /// Decode a value from a tagged payload
    pub fn decode(payload: &[u8]) -> Result<Self, FrameError> {
        let mut r = Reader { data: payload };
        match r.u8()? {
            VALUE_INTEGER => Ok(Value::Integer(r.i32()?)),
            VALUE_STRING => text(r.rest()),
            VALUE_BOOLEAN => Ok(Value::Boolean(r.u8()? != 0)),
            VALUE_LIST => {
                let total = r.u16()?;
                let sent = r.u8()?;
                let items = (0..sent)
                    .map(|_| Self::decode_item(&mut r))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::List { total, items })
            }
            VALUE_BYTEARRAY => Self::decode_bytes(&mut r),
            _ => Err(FrameError::InvalidValue),
        }
    }

    /// Decode one list item
    fn decode_item(r: &mut Reader<'_>) -> Result<Self, FrameError> {
        match r.u8()? {
            VALUE_UNKNOWN => Ok(Value::Unknown),
            VALUE_INTEGER => Ok(Value::Integer(r.i32()?)),
            VALUE_STRING => {
                let len = r.u8()? as usize;
                text(r.take(len)?)
            }
            VALUE_BOOLEAN => Ok(Value::Boolean(r.u8()? != 0)),
            VALUE_LIST => {
                // Sublists are sent as a count only
                let total = r.u16()?;
                if r.u8()? != 0 {
                    return Err(FrameError::InvalidValue);
                }
                Ok(Value::List {
                    total,
                    items: Vec::new(),
                })
            }
            VALUE_BYTEARRAY => Self::decode_bytes(r),
            _ => Err(FrameError::InvalidValue),
        }
    }

    fn decode_bytes(r: &mut Reader<'_>) -> Result<Self, FrameError> {
        let total = r.u16()?;
        let sent = r.u8()? as usize;
        let bytes = r.take(sent)?.to_vec();
        Ok(Value::ByteArray { total, bytes })
    }

    /// Returns the text if this is a string value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::List { total, items } => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                if usize::from(*total) > items.len() {
                    if !items.is_empty() {
                        f.write_str(", ")?;
                    }
                    write!(f, "... {} items", total)?;
                }
                f.write_str("]")
            }
            Value::ByteArray { total, bytes } => {
                f.write_str("(")?;
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{:02x}", b)?;
                }
                if usize::from(*total) > bytes.len() {
                    if !bytes.is_empty() {
                        f.write_str(" ")?;
                    }
                    write!(f, "... {} bytes", total)?;
                }
                f.write_str(")")
            }
            Value::Unknown => f.write_str("?"),
        }
    }
}
