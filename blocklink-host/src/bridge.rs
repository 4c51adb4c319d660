//! Broadcast bridge
//!
//! Couples a transport with a [`StreamParser`]. Outgoing messages are
//! encoded and written in one call; incoming bytes are read without
//! blocking and turned into frames, keeping any partial frame for the next
//! poll.

use blocklink_hal::Transport;
use blocklink_protocol::{
    decode_broadcast, encode_broadcast, DeviceMessage, Filter, Frame, FrameError, HostCommand,
    StreamParser, MSG_BROADCAST,
};
use tracing::{debug, trace, warn};

use crate::error::BridgeError;

/// Default number of bytes requested per read
pub const DEFAULT_READ_CHUNK: usize = 256;

/// Host end of a board connection
pub struct Bridge<T> {
    transport: T,
    parser: StreamParser,
    read_buf: Vec<u8>,
}

impl<T> Bridge<T>
where
    T: Transport,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    /// Create a bridge over an open transport
    pub fn new(transport: T) -> Self {
        Self::with_read_chunk(transport, DEFAULT_READ_CHUNK)
    }

    /// Create a bridge that requests at most `chunk` bytes per read
    pub fn with_read_chunk(transport: T, chunk: usize) -> Self {
        Self {
            transport,
            parser: StreamParser::with_capacity(chunk),
            read_buf: vec![0u8; chunk.max(1)],
        }
    }

    /// Send a broadcast to the board
    ///
    /// Fails with [`FrameError::PayloadTooLarge`] before anything is
    /// written if the text does not fit in one frame.
    pub fn send_broadcast(&mut self, text: &str) -> Result<(), BridgeError> {
        let bytes = encode_broadcast(text)?;
        debug!(text, bytes = bytes.len(), "sending broadcast");
        self.write(&bytes)
    }

    /// Send a command to the board
    pub fn send(&mut self, command: &HostCommand<'_>) -> Result<(), BridgeError> {
        let bytes = command.to_frame()?.encode();
        debug!(?command, bytes = bytes.len(), "sending command");
        self.write(&bytes)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), BridgeError> {
        self.transport
            .write_all(bytes)
            .map_err(BridgeError::transport)?;
        self.transport.flush().map_err(BridgeError::transport)
    }

    /// Read what is available and return the complete frames accepted by `filter`
    pub fn poll(&mut self, filter: Filter) -> Result<Vec<Frame>, BridgeError> {
        let n = self
            .transport
            .read_available(&mut self.read_buf)
            .map_err(BridgeError::transport)?;
        if n == 0 {
            return Ok(Vec::new());
        }
        trace!(bytes = n, "read");

        let frames = self.parser.feed(&self.read_buf[..n], filter);
        if !self.parser.buffered().is_empty() {
            trace!(buffered = self.parser.buffered().len(), "partial frame held");
        }
        Ok(frames)
    }

    /// Read what is available and decode any complete broadcasts
    ///
    /// A broadcast that fails to decode is reported in place; the
    /// broadcasts after it are still returned.
    pub fn receive_broadcasts(&mut self) -> Result<Vec<Result<String, FrameError>>, BridgeError> {
        let frames = self.poll(Filter::ByType(MSG_BROADCAST))?;
        Ok(frames
            .iter()
            .map(|frame| {
                decode_broadcast(frame).inspect_err(|e| warn!(error = %e, "undecodable broadcast"))
            })
            .collect())
    }

    /// Read what is available and parse every complete frame into a message
    pub fn receive_messages(
        &mut self,
    ) -> Result<Vec<Result<DeviceMessage, FrameError>>, BridgeError> {
        let frames = self.poll(Filter::Any)?;
        Ok(frames
            .iter()
            .map(|frame| {
                DeviceMessage::from_frame(frame).inspect_err(|e| {
                    warn!(msg_type = frame.msg_type(), error = %e, "undecodable message")
                })
            })
            .collect())
    }

    /// Bytes held back waiting for the rest of a frame
    pub fn pending_bytes(&self) -> usize {
        self.parser.buffered().len()
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Borrow the transport mutably
    ///
    /// Bytes read directly from it bypass the parser.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the transport, dropping any partial frame
    pub fn into_inner(self) -> T {
        self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocklink_hal::Loopback;
    use blocklink_protocol::{encode_long, Value};
    use proptest::prelude::*;

    #[test]
    fn test_send_broadcast_writes_frame() {
        let mut bridge = Bridge::new(Loopback::new());
        bridge.send_broadcast("happy").unwrap();
        assert_eq!(
            bridge.transport().written(),
            &[251, 27, 0, 6, 0, 104, 97, 112, 112, 121, 254]
        );
    }

    #[test]
    fn test_send_broadcast_too_large_writes_nothing() {
        let mut bridge = Bridge::new(Loopback::new());
        let text = "a".repeat(70_000);
        let err = bridge.send_broadcast(&text).unwrap_err();
        assert!(matches!(err, BridgeError::Frame(FrameError::PayloadTooLarge)));
        assert!(bridge.transport().written().is_empty());
    }

    #[test]
    fn test_send_command() {
        let mut bridge = Bridge::new(Loopback::new());
        bridge.send(&HostCommand::StopAll).unwrap();
        assert_eq!(bridge.transport().written(), &[250, 6, 0]);
    }

    #[test]
    fn test_receive_broadcasts() {
        let mut lb = Loopback::new();
        lb.push_incoming(&encode_broadcast("sad").unwrap());
        lb.push_incoming(&[250, 26, 0]);
        lb.push_incoming(&encode_broadcast("clear").unwrap());

        let mut bridge = Bridge::new(lb);
        let received = bridge.receive_broadcasts().unwrap();
        assert_eq!(received, vec![Ok("sad".to_string()), Ok("clear".to_string())]);
    }

    #[test]
    fn test_receive_nothing() {
        let mut bridge = Bridge::new(Loopback::new());
        assert!(bridge.receive_broadcasts().unwrap().is_empty());
    }

    #[test]
    fn test_broadcast_split_across_reads() {
        let mut lb = Loopback::with_max_read(4);
        lb.push_incoming(&encode_broadcast("happy").unwrap());
        let mut bridge = Bridge::new(lb);

        assert!(bridge.receive_broadcasts().unwrap().is_empty());
        assert_eq!(bridge.pending_bytes(), 4);
        assert!(bridge.receive_broadcasts().unwrap().is_empty());
        assert_eq!(
            bridge.receive_broadcasts().unwrap(),
            vec![Ok("happy".to_string())]
        );
        assert_eq!(bridge.pending_bytes(), 0);
    }

    #[test]
    fn test_bad_broadcast_reported_in_place() {
        let mut lb = Loopback::new();
        lb.push_incoming(&encode_long(MSG_BROADCAST, 0, &[0xFF]).unwrap());
        lb.push_incoming(&encode_broadcast("ok").unwrap());

        let mut bridge = Bridge::new(lb);
        let received = bridge.receive_broadcasts().unwrap();
        assert_eq!(
            received,
            vec![Err(FrameError::InvalidUtf8), Ok("ok".to_string())]
        );
    }

    #[test]
    fn test_receive_messages() {
        let mut lb = Loopback::new();
        lb.push_incoming(&[250, 26, 3]);
        lb.push_incoming(&encode_long(20, 1, &[2, b'h', b'i']).unwrap());

        let mut bridge = Bridge::new(lb);
        let messages = bridge.receive_messages().unwrap();
        assert_eq!(
            messages,
            vec![
                Ok(DeviceMessage::Ping { param: 3 }),
                Ok(DeviceMessage::Output {
                    chunk: 1,
                    value: Value::Text("hi".to_string())
                }),
            ]
        );
    }

    #[test]
    fn test_board_var_names_reply() {
        let mut bridge = Bridge::new(Loopback::new());
        bridge.send(&HostCommand::GetVarNames).unwrap();
        assert_eq!(bridge.transport_mut().take_written(), [250, 9, 0]);

        // One unterminated frame per variable, LENGTH = name length
        bridge
            .transport_mut()
            .push_incoming(&[251, 29, 0, 5, 0, b'c', b'o', b'u', b'n', b't']);
        bridge
            .transport_mut()
            .push_incoming(&[251, 29, 1, 1, 0, b'x']);

        let messages = bridge.receive_messages().unwrap();
        assert_eq!(
            messages,
            vec![
                Ok(DeviceMessage::VarName {
                    var: 0,
                    name: "count".to_string()
                }),
                Ok(DeviceMessage::VarName {
                    var: 1,
                    name: "x".to_string()
                }),
            ]
        );
    }

    #[test]
    fn test_transport_error_surfaces() {
        let mut lb = Loopback::new();
        lb.close();
        let mut bridge = Bridge::new(lb);
        assert!(matches!(
            bridge.receive_broadcasts(),
            Err(BridgeError::Transport(_))
        ));
        assert!(matches!(
            bridge.send_broadcast("x"),
            Err(BridgeError::Transport(_))
        ));
    }

    #[test]
    fn test_into_inner_returns_transport() {
        let mut bridge = Bridge::new(Loopback::new());
        bridge.send(&HostCommand::Ping).unwrap();
        let lb = bridge.into_inner();
        assert_eq!(lb.written(), &[250, 26, 0]);
    }

    proptest! {
        #[test]
        fn prop_any_read_size_delivers_all(
            texts in proptest::collection::vec("[a-zA-Z0-9]{0,30}", 1..6),
            max_read in 1usize..16,
        ) {
            let mut lb = Loopback::with_max_read(max_read);
            for text in &texts {
                lb.push_incoming(&encode_broadcast(text).unwrap());
            }
            let mut bridge = Bridge::new(lb);

            let mut received = Vec::new();
            while bridge.transport().pending() > 0 {
                for msg in bridge.receive_broadcasts().unwrap() {
                    received.push(msg.unwrap());
                }
            }
            prop_assert_eq!(received, texts);
            prop_assert_eq!(bridge.pending_bytes(), 0);
        }
    }
}
