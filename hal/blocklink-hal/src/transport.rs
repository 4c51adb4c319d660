//! Serial transport abstractions
//!
//! Provides the traits the bridge needs from a byte-oriented duplex link.
//! Reads never block: they return whatever is already available.

/// Duplex byte transport
pub trait Transport {
    /// Error type for transport operations
    type Error;

    /// Write all of `data`, in order
    ///
    /// Bytes are handed to the link best-effort; there is no
    /// acknowledgement at this layer.
    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Read the bytes that are currently available into `buf`
    ///
    /// Returns immediately with the number of bytes copied, which is zero
    /// when nothing is pending.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered outgoing data
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        (**self).write_all(data)
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        (**self).read_available(buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        (**self).flush()
    }
}

/// Opens transports by identifier (device path, port name, ...)
pub trait Connector {
    /// Transport produced by [`Connector::open`]
    type Connection: Transport;
    /// Error type for open/close
    type Error;

    /// Open a connection
    fn open(&mut self, identifier: &str, config: &SerialConfig)
        -> Result<Self::Connection, Self::Error>;

    /// Close a connection
    ///
    /// The default implementation releases the connection by dropping it.
    fn close(&mut self, connection: Self::Connection) -> Result<(), Self::Error> {
        drop(connection);
        Ok(())
    }
}

/// Serial line configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl SerialConfig {
    /// Default line settings at a different baud rate
    pub fn with_baudrate(baudrate: u32) -> Self {
        Self {
            baudrate,
            ..Self::default()
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Number of data bits per character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_115200_8n1() {
        let config = SerialConfig::default();
        assert_eq!(config.baudrate, 115200);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.stop_bits, StopBits::One);
    }

    #[test]
    fn test_with_baudrate() {
        let config = SerialConfig::with_baudrate(9600);
        assert_eq!(config.baudrate, 9600);
        assert_eq!(config.parity, Parity::None);
    }
}
