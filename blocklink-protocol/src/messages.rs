//! Message types understood by the board
//!
//! Message types are divided into three groups:
//! - Host → Board: code management, task control, variable access
//! - Board → Host: task status, output, variable values, version
//! - Bidirectional: ping, broadcast, and a few metadata messages

use alloc::string::String;

use crate::frame::{Frame, FrameError};
use crate::value::Value;

// Message type IDs: Host → Board
pub const MSG_CHUNK_CODE: u8 = 1;
pub const MSG_DELETE_CHUNK: u8 = 2;
pub const MSG_START_CHUNK: u8 = 3;
pub const MSG_STOP_CHUNK: u8 = 4;
pub const MSG_START_ALL: u8 = 5;
pub const MSG_STOP_ALL: u8 = 6;
pub const MSG_GET_VAR: u8 = 7;
pub const MSG_SET_VAR: u8 = 8;
pub const MSG_GET_VAR_NAMES: u8 = 9;
pub const MSG_CLEAR_VARS: u8 = 10;
pub const MSG_GET_VERSION: u8 = 12;
pub const MSG_GET_ALL_CODE: u8 = 13;
pub const MSG_DELETE_ALL_CODE: u8 = 14;
pub const MSG_SYSTEM_RESET: u8 = 15;

// Message type IDs: Board → Host
pub const MSG_TASK_STARTED: u8 = 16;
pub const MSG_TASK_DONE: u8 = 17;
pub const MSG_TASK_RETURNED_VALUE: u8 = 18;
pub const MSG_TASK_ERROR: u8 = 19;
pub const MSG_OUTPUT_VALUE: u8 = 20;
pub const MSG_VAR_VALUE: u8 = 21;
pub const MSG_VERSION: u8 = 22;

// Message type IDs: bidirectional
pub const MSG_PING: u8 = 26;
pub const MSG_BROADCAST: u8 = 27;
pub const MSG_CHUNK_ATTRIBUTE: u8 = 28;
pub const MSG_VAR_NAME: u8 = 29;
pub const MSG_EXTENDED: u8 = 30;

/// Known message types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageType {
    ChunkCode,
    DeleteChunk,
    StartChunk,
    StopChunk,
    StartAll,
    StopAll,
    GetVar,
    SetVar,
    GetVarNames,
    ClearVars,
    GetVersion,
    GetAllCode,
    DeleteAllCode,
    SystemReset,
    TaskStarted,
    TaskDone,
    TaskReturnedValue,
    TaskError,
    OutputValue,
    VarValue,
    Version,
    Ping,
    Broadcast,
    ChunkAttribute,
    VarName,
    Extended,
}

impl MessageType {
    /// Parse a message type from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        let msg_type = match byte {
            MSG_CHUNK_CODE => MessageType::ChunkCode,
            MSG_DELETE_CHUNK => MessageType::DeleteChunk,
            MSG_START_CHUNK => MessageType::StartChunk,
            MSG_STOP_CHUNK => MessageType::StopChunk,
            MSG_START_ALL => MessageType::StartAll,
            MSG_STOP_ALL => MessageType::StopAll,
            MSG_GET_VAR => MessageType::GetVar,
            MSG_SET_VAR => MessageType::SetVar,
            MSG_GET_VAR_NAMES => MessageType::GetVarNames,
            MSG_CLEAR_VARS => MessageType::ClearVars,
            MSG_GET_VERSION => MessageType::GetVersion,
            MSG_GET_ALL_CODE => MessageType::GetAllCode,
            MSG_DELETE_ALL_CODE => MessageType::DeleteAllCode,
            MSG_SYSTEM_RESET => MessageType::SystemReset,
            MSG_TASK_STARTED => MessageType::TaskStarted,
            MSG_TASK_DONE => MessageType::TaskDone,
            MSG_TASK_RETURNED_VALUE => MessageType::TaskReturnedValue,
            MSG_TASK_ERROR => MessageType::TaskError,
            MSG_OUTPUT_VALUE => MessageType::OutputValue,
            MSG_VAR_VALUE => MessageType::VarValue,
            MSG_VERSION => MessageType::Version,
            MSG_PING => MessageType::Ping,
            MSG_BROADCAST => MessageType::Broadcast,
            MSG_CHUNK_ATTRIBUTE => MessageType::ChunkAttribute,
            MSG_VAR_NAME => MessageType::VarName,
            MSG_EXTENDED => MessageType::Extended,
            _ => return None,
        };
        Some(msg_type)
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            MessageType::ChunkCode => MSG_CHUNK_CODE,
            MessageType::DeleteChunk => MSG_DELETE_CHUNK,
            MessageType::StartChunk => MSG_START_CHUNK,
            MessageType::StopChunk => MSG_STOP_CHUNK,
            MessageType::StartAll => MSG_START_ALL,
            MessageType::StopAll => MSG_STOP_ALL,
            MessageType::GetVar => MSG_GET_VAR,
            MessageType::SetVar => MSG_SET_VAR,
            MessageType::GetVarNames => MSG_GET_VAR_NAMES,
            MessageType::ClearVars => MSG_CLEAR_VARS,
            MessageType::GetVersion => MSG_GET_VERSION,
            MessageType::GetAllCode => MSG_GET_ALL_CODE,
            MessageType::DeleteAllCode => MSG_DELETE_ALL_CODE,
            MessageType::SystemReset => MSG_SYSTEM_RESET,
            MessageType::TaskStarted => MSG_TASK_STARTED,
            MessageType::TaskDone => MSG_TASK_DONE,
            MessageType::TaskReturnedValue => MSG_TASK_RETURNED_VALUE,
            MessageType::TaskError => MSG_TASK_ERROR,
            MessageType::OutputValue => MSG_OUTPUT_VALUE,
            MessageType::VarValue => MSG_VAR_VALUE,
            MessageType::Version => MSG_VERSION,
            MessageType::Ping => MSG_PING,
            MessageType::Broadcast => MSG_BROADCAST,
            MessageType::ChunkAttribute => MSG_CHUNK_ATTRIBUTE,
            MessageType::VarName => MSG_VAR_NAME,
            MessageType::Extended => MSG_EXTENDED,
        }
    }
}

/// Commands sent from the host to the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand<'a> {
    /// Heartbeat; the board answers with a ping carrying the same param
    Ping,
    /// Ask the board for its firmware version string
    GetVersion,
    /// Start every hat-block script
    StartAll,
    /// Stop every running task
    StopAll,
    /// Start the task for one code chunk
    StartChunk(u8),
    /// Stop the task for one code chunk
    StopChunk(u8),
    /// Request the value of a variable by index
    GetVar(u8),
    /// Request the names of all variables
    GetVarNames,
    /// Clear all variables
    ClearVars,
    /// Soft-reset the board
    SystemReset,
    /// Fire a named broadcast on the board
    Broadcast(&'a str),
}

impl<'a> HostCommand<'a> {
    /// Encode this command into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        let frame = match self {
            HostCommand::Ping => Frame::short(MSG_PING, 0),
            HostCommand::GetVersion => Frame::short(MSG_GET_VERSION, 0),
            HostCommand::StartAll => Frame::short(MSG_START_ALL, 0),
            HostCommand::StopAll => Frame::short(MSG_STOP_ALL, 0),
            HostCommand::StartChunk(id) => Frame::short(MSG_START_CHUNK, *id),
            HostCommand::StopChunk(id) => Frame::short(MSG_STOP_CHUNK, *id),
            HostCommand::GetVar(id) => Frame::short(MSG_GET_VAR, *id),
            HostCommand::GetVarNames => Frame::short(MSG_GET_VAR_NAMES, 0),
            HostCommand::ClearVars => Frame::short(MSG_CLEAR_VARS, 0),
            HostCommand::SystemReset => Frame::short(MSG_SYSTEM_RESET, 0),
            HostCommand::Broadcast(text) => Frame::long(MSG_BROADCAST, 0, text.as_bytes())?,
        };
        Ok(frame)
    }
}

/// Messages parsed from board-originated frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceMessage {
    /// Named broadcast fired by a script on the board
    Broadcast(String),
    /// Ping reply or acknowledgement
    Ping { param: u8 },
    /// Firmware version string
    Version(String),
    /// Output of a `say`/`print` block
    Output { chunk: u8, value: Value },
    /// Value of a variable
    VarValue { var: u8, value: Value },
    /// Name of a variable, one per variable in reply to `GetVarNames`
    VarName { var: u8, name: String },
    /// A task started running
    TaskStarted { chunk: u8 },
    /// A task finished
    TaskDone { chunk: u8 },
    /// A task finished and returned a value
    TaskReturned { chunk: u8, value: Value },
    /// A task stopped with an error code at a code location
    TaskError { chunk: u8, code: u8, location: u32 },
    /// Any other frame, passed through unchanged
    Other(Frame),
}

impl DeviceMessage {
    /// Parse a message from a frame
    ///
    /// Long frames are read through [`LongFrame::body`](crate::LongFrame::body),
    /// so both the terminated layout and the board's own unterminated layout
    /// decode to the same message.
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        let param = frame.param();
        let msg = match (frame.msg_type(), frame) {
            (MSG_BROADCAST, Frame::Long(f)) => DeviceMessage::Broadcast(f.text()?),
            (MSG_PING, _) => DeviceMessage::Ping { param },
            (MSG_VERSION, Frame::Long(f)) => {
                let value = Value::decode(&f.body())?;
                let text = value.as_text().ok_or(FrameError::InvalidValue)?;
                DeviceMessage::Version(String::from(text.trim()))
            }
            (MSG_OUTPUT_VALUE, Frame::Long(f)) => DeviceMessage::Output {
                chunk: param,
                value: Value::decode(&f.body())?,
            },
            (MSG_VAR_VALUE, Frame::Long(f)) => DeviceMessage::VarValue {
                var: param,
                value: Value::decode(&f.body())?,
            },
            (MSG_VAR_NAME, Frame::Long(f)) => DeviceMessage::VarName {
                var: param,
                name: f.text()?,
            },
            (MSG_TASK_STARTED, _) => DeviceMessage::TaskStarted { chunk: param },
            (MSG_TASK_DONE, _) => DeviceMessage::TaskDone { chunk: param },
            (MSG_TASK_RETURNED_VALUE, Frame::Long(f)) => DeviceMessage::TaskReturned {
                chunk: param,
                value: Value::decode(&f.body())?,
            },
            (MSG_TASK_ERROR, Frame::Long(f)) => {
                // Body: [code][location: u32 LE]
                let body = f.body();
                if body.len() < 5 {
                    return Err(FrameError::InvalidFrame);
                }
                DeviceMessage::TaskError {
                    chunk: param,
                    code: body[0],
                    location: u32::from_le_bytes([body[1], body[2], body[3], body[4]]),
                }
            }
            (
                MSG_BROADCAST | MSG_VERSION | MSG_OUTPUT_VALUE | MSG_VAR_VALUE | MSG_VAR_NAME
                | MSG_TASK_RETURNED_VALUE | MSG_TASK_ERROR,
                Frame::Short(_),
            ) => return Err(FrameError::InvalidFrame),
            _ => DeviceMessage::Other(frame.clone()),
        };
        Ok(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encode_broadcast;
    use crate::parser::{Filter, StreamParser};
    use alloc::vec::Vec;

    #[test]
    fn test_message_type_roundtrip() {
        for byte in 0..=u8::MAX {
            if let Some(msg_type) = MessageType::from_byte(byte) {
                assert_eq!(msg_type.to_byte(), byte);
            }
        }
        assert_eq!(MessageType::from_byte(27), Some(MessageType::Broadcast));
    }

    #[test]
    fn test_unknown_message_type() {
        assert!(MessageType::from_byte(0).is_none());
        assert!(MessageType::from_byte(11).is_none());
        assert!(MessageType::from_byte(250).is_none());
    }

    #[test]
    fn test_host_command_ping() {
        let frame = HostCommand::Ping.to_frame().unwrap();
        assert_eq!(frame.encode(), [250, MSG_PING, 0]);
    }

    #[test]
    fn test_host_command_start_chunk() {
        let frame = HostCommand::StartChunk(4).to_frame().unwrap();
        assert_eq!(frame, Frame::short(MSG_START_CHUNK, 4));
    }

    #[test]
    fn test_host_command_broadcast_matches_encoder() {
        let frame = HostCommand::Broadcast("sad").to_frame().unwrap();
        assert_eq!(frame.encode(), encode_broadcast("sad").unwrap());
    }

    #[test]
    fn test_device_broadcast() {
        let frame = Frame::long(MSG_BROADCAST, 0, b"clear").unwrap();
        let msg = DeviceMessage::from_frame(&frame).unwrap();
        assert_eq!(msg, DeviceMessage::Broadcast(String::from("clear")));
    }

    #[test]
    fn test_device_version() {
        let frame = Frame::long(MSG_VERSION, 0, b"\x02 v1.2 microbit").unwrap();
        let msg = DeviceMessage::from_frame(&frame).unwrap();
        assert_eq!(msg, DeviceMessage::Version(String::from("v1.2 microbit")));
    }

    #[test]
    fn test_device_output_integer() {
        let frame = Frame::long(MSG_OUTPUT_VALUE, 3, &[1, 7, 0, 0, 0]).unwrap();
        let msg = DeviceMessage::from_frame(&frame).unwrap();
        assert_eq!(
            msg,
            DeviceMessage::Output {
                chunk: 3,
                value: Value::Integer(7)
            }
        );
    }

    #[test]
    fn test_device_task_error() {
        let frame = Frame::long(MSG_TASK_ERROR, 2, &[13, 0x10, 0x20, 0, 0]).unwrap();
        let msg = DeviceMessage::from_frame(&frame).unwrap();
        assert_eq!(
            msg,
            DeviceMessage::TaskError {
                chunk: 2,
                code: 13,
                location: 0x2010
            }
        );
    }

    #[test]
    fn test_device_task_error_truncated() {
        let frame = Frame::long(MSG_TASK_ERROR, 2, &[13]).unwrap();
        assert_eq!(
            DeviceMessage::from_frame(&frame),
            Err(FrameError::InvalidFrame)
        );
    }

    #[test]
    fn test_device_short_ping_and_task_done() {
        assert_eq!(
            DeviceMessage::from_frame(&Frame::short(MSG_PING, 9)).unwrap(),
            DeviceMessage::Ping { param: 9 }
        );
        assert_eq!(
            DeviceMessage::from_frame(&Frame::short(MSG_TASK_DONE, 1)).unwrap(),
            DeviceMessage::TaskDone { chunk: 1 }
        );
    }

    #[test]
    fn test_device_var_name_from_board() {
        // Board layout: LENGTH = strlen(name), no terminator
        let mut parser = StreamParser::new();
        let frames = parser.feed(
            &[251, MSG_VAR_NAME, 3, 5, 0, b'c', b'o', b'u', b'n', b't'],
            Filter::Any,
        );
        assert_eq!(
            DeviceMessage::from_frame(&frames[0]).unwrap(),
            DeviceMessage::VarName {
                var: 3,
                name: String::from("count")
            }
        );
    }

    #[test]
    fn test_device_var_name_terminated() {
        let frame = Frame::long(MSG_VAR_NAME, 0, b"n").unwrap();
        assert_eq!(
            DeviceMessage::from_frame(&frame).unwrap(),
            DeviceMessage::VarName {
                var: 0,
                name: String::from("n")
            }
        );
    }

    #[test]
    fn test_device_values_from_board() {
        let mut parser = StreamParser::new();
        let data = [
            251, MSG_OUTPUT_VALUE, 1, 3, 0, 2, b'h', b'i', // say "hi"
            251, MSG_VAR_VALUE, 0, 5, 0, 1, 0x2A, 0, 0, 0, // var 0 = 42
            251, MSG_TASK_RETURNED_VALUE, 2, 2, 0, 3, 1, // returned true
            251, MSG_OUTPUT_VALUE, 4, 6, 0, 5, 2, 0, 2, 0xAB, 0xCD, // bytearray
        ];
        let messages: Vec<DeviceMessage> = parser
            .feed(&data, Filter::Any)
            .iter()
            .map(|f| DeviceMessage::from_frame(f).unwrap())
            .collect();
        assert_eq!(
            messages,
            [
                DeviceMessage::Output {
                    chunk: 1,
                    value: Value::Text(String::from("hi"))
                },
                DeviceMessage::VarValue {
                    var: 0,
                    value: Value::Integer(42)
                },
                DeviceMessage::TaskReturned {
                    chunk: 2,
                    value: Value::Boolean(true)
                },
                DeviceMessage::Output {
                    chunk: 4,
                    value: Value::ByteArray {
                        total: 2,
                        bytes: alloc::vec![0xAB, 0xCD]
                    }
                },
            ]
        );
    }

    #[test]
    fn test_device_list_output() {
        let frame = Frame::long(MSG_OUTPUT_VALUE, 0, &[4, 2, 0, 2, 1, 1, 0, 0, 0, 1, 2, 0, 0, 0])
            .unwrap();
        assert_eq!(
            DeviceMessage::from_frame(&frame).unwrap(),
            DeviceMessage::Output {
                chunk: 0,
                value: Value::List {
                    total: 2,
                    items: alloc::vec![Value::Integer(1), Value::Integer(2)]
                }
            }
        );
    }

    #[test]
    fn test_device_unknown_passes_through() {
        let frame = Frame::short(200, 1);
        let msg = DeviceMessage::from_frame(&frame).unwrap();
        assert_eq!(msg, DeviceMessage::Other(frame));
    }
}
