//! In-memory loopback transport
//!
//! Stands in for a board during tests and simulation: bytes queued with
//! [`Loopback::push_incoming`] are returned by reads, and everything the
//! host writes is collected for inspection.

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::transport::{Connector, SerialConfig, Transport};

/// Errors from the loopback transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopbackError {
    /// The transport was closed
    Closed,
}

impl fmt::Display for LoopbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopbackError::Closed => f.write_str("loopback transport closed"),
        }
    }
}

impl core::error::Error for LoopbackError {}

/// In-memory duplex transport
#[derive(Debug, Default)]
pub struct Loopback {
    incoming: VecDeque<u8>,
    written: Vec<u8>,
    /// Upper bound on bytes returned per read, to simulate fragmented reads
    max_read: Option<usize>,
    closed: bool,
}

impl Loopback {
    /// Create an empty loopback
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit every read to at most `max` bytes
    pub fn with_max_read(max: usize) -> Self {
        Self {
            max_read: Some(max.max(1)),
            ..Self::default()
        }
    }

    /// Queue bytes as if the board had sent them
    pub fn push_incoming(&mut self, bytes: &[u8]) {
        self.incoming.extend(bytes.iter().copied());
    }

    /// Number of queued bytes not yet read
    pub fn pending(&self) -> usize {
        self.incoming.len()
    }

    /// Bytes written by the host so far
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Take and clear the bytes written by the host
    pub fn take_written(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.written)
    }

    /// Mark the transport closed; further I/O fails
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Returns true once [`Loopback::close`] has been called
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Transport for Loopback {
    type Error = LoopbackError;

    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        if self.closed {
            return Err(LoopbackError::Closed);
        }
        self.written.extend_from_slice(data);
        Ok(())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.closed {
            return Err(LoopbackError::Closed);
        }
        let limit = self.max_read.unwrap_or(usize::MAX);
        let n = buf.len().min(self.incoming.len()).min(limit);
        for (slot, byte) in buf.iter_mut().zip(self.incoming.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

/// Connector that hands out fresh [`Loopback`] transports
#[derive(Debug, Default)]
pub struct LoopbackConnector {
    opened: Vec<String>,
}

impl LoopbackConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers passed to [`Connector::open`], in call order
    pub fn opened(&self) -> &[String] {
        &self.opened
    }
}

impl Connector for LoopbackConnector {
    type Connection = Loopback;
    type Error = LoopbackError;

    fn open(&mut self, identifier: &str, _config: &SerialConfig) -> Result<Loopback, Self::Error> {
        self.opened.push(String::from(identifier));
        Ok(Loopback::new())
    }

    fn close(&mut self, mut connection: Loopback) -> Result<(), Self::Error> {
        connection.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_returns_zero_when_empty() {
        let mut lb = Loopback::new();
        let mut buf = [0u8; 8];
        assert_eq!(lb.read_available(&mut buf), Ok(0));
    }

    #[test]
    fn test_read_drains_in_order() {
        let mut lb = Loopback::new();
        lb.push_incoming(&[1, 2, 3]);
        let mut buf = [0u8; 2];
        assert_eq!(lb.read_available(&mut buf), Ok(2));
        assert_eq!(buf, [1, 2]);
        assert_eq!(lb.read_available(&mut buf), Ok(1));
        assert_eq!(buf[0], 3);
        assert_eq!(lb.pending(), 0);
    }

    #[test]
    fn test_max_read_fragments() {
        let mut lb = Loopback::with_max_read(1);
        lb.push_incoming(&[9, 8]);
        let mut buf = [0u8; 8];
        assert_eq!(lb.read_available(&mut buf), Ok(1));
        assert_eq!(lb.pending(), 1);
    }

    #[test]
    fn test_writes_collected() {
        let mut lb = Loopback::new();
        lb.write_all(&[250, 26, 0]).unwrap();
        lb.write_all(&[1]).unwrap();
        assert_eq!(lb.written(), &[250, 26, 0, 1]);
        assert_eq!(lb.take_written(), [250, 26, 0, 1]);
        assert!(lb.written().is_empty());
    }

    #[test]
    fn test_closed_transport_fails() {
        let mut lb = Loopback::new();
        lb.close();
        assert_eq!(lb.write_all(&[1]), Err(LoopbackError::Closed));
        assert_eq!(lb.read_available(&mut [0u8; 1]), Err(LoopbackError::Closed));
    }

    #[test]
    fn test_connector_open_close() {
        let mut connector = LoopbackConnector::new();
        let config = SerialConfig::default();
        let conn = connector.open("loop0", &config).unwrap();
        assert_eq!(connector.opened(), ["loop0"]);
        assert!(connector.close(conn).is_ok());
    }
}
