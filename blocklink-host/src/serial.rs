//! Serial port transport
//!
//! Implements the HAL transport traits on top of the `serialport` crate.
//! Reads check how many bytes the OS has already buffered and never wait
//! for more.

use std::io::{self, Read, Write};
use std::time::Duration;

use blocklink_hal::{Connector, DataBits, Parity, SerialConfig, StopBits, Transport};
use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use thiserror::Error;
use tracing::{debug, info};

/// Upper bound for a read the OS already reported data for
const READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Errors from the serial transport
#[derive(Debug, Error)]
pub enum SerialError {
    #[error(transparent)]
    Serial(#[from] serialport::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// An open serial port
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialTransport {
    /// Device name the port was opened with
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("name", &self.name)
            .finish()
    }
}

/// Timeouts and interrupted reads mean "nothing right now", not failure
fn is_idle(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

impl Transport for SerialTransport {
    type Error = SerialError;

    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.port.write_all(data)?;
        Ok(())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let pending = self.port.bytes_to_read()? as usize;
        if pending == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = pending.min(buf.len());
        match self.port.read(&mut buf[..want]) {
            Ok(n) => Ok(n),
            Err(e) if is_idle(&e) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.port.flush()?;
        Ok(())
    }
}

/// Opens [`SerialTransport`]s by device path
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialConnector;

impl SerialConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for SerialConnector {
    type Connection = SerialTransport;
    type Error = SerialError;

    fn open(&mut self, identifier: &str, config: &SerialConfig) -> Result<SerialTransport, Self::Error> {
        let port = serialport::new(identifier, config.baudrate)
            .data_bits(match config.data_bits {
                DataBits::Seven => serialport::DataBits::Seven,
                DataBits::Eight => serialport::DataBits::Eight,
            })
            .parity(match config.parity {
                Parity::None => serialport::Parity::None,
                Parity::Even => serialport::Parity::Even,
                Parity::Odd => serialport::Parity::Odd,
            })
            .stop_bits(match config.stop_bits {
                StopBits::One => serialport::StopBits::One,
                StopBits::Two => serialport::StopBits::Two,
            })
            .timeout(READ_TIMEOUT)
            .open()?;

        info!(port = identifier, baudrate = config.baudrate, "serial port opened");
        Ok(SerialTransport {
            port,
            name: identifier.to_string(),
        })
    }

    fn close(&mut self, mut connection: SerialTransport) -> Result<(), Self::Error> {
        connection.flush()?;
        debug!(port = %connection.name, "serial port closed");
        Ok(())
    }
}

/// List the serial ports present on this machine
pub fn available_ports() -> Result<Vec<SerialPortInfo>, SerialError> {
    Ok(serialport::available_ports()?)
}

/// One-line description of a port for listings
pub fn describe_port(info: &SerialPortInfo) -> String {
    match &info.port_type {
        SerialPortType::UsbPort(usb) => {
            let product = usb.product.as_deref().unwrap_or("USB device");
            format!(
                "{} ({}, {:04x}:{:04x})",
                info.port_name, product, usb.vid, usb.pid
            )
        }
        SerialPortType::BluetoothPort => format!("{} (Bluetooth)", info.port_name),
        SerialPortType::PciPort => format!("{} (PCI)", info.port_name),
        SerialPortType::Unknown => info.port_name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_errors() {
        assert!(is_idle(&io::Error::from(io::ErrorKind::TimedOut)));
        assert!(is_idle(&io::Error::from(io::ErrorKind::WouldBlock)));
        assert!(!is_idle(&io::Error::from(io::ErrorKind::BrokenPipe)));
    }

    #[test]
    fn test_describe_unknown_port() {
        let info = SerialPortInfo {
            port_name: "/dev/ttyACM0".to_string(),
            port_type: SerialPortType::Unknown,
        };
        assert_eq!(describe_port(&info), "/dev/ttyACM0");
    }

    #[test]
    fn test_describe_bluetooth_port() {
        let info = SerialPortInfo {
            port_name: "/dev/rfcomm0".to_string(),
            port_type: SerialPortType::BluetoothPort,
        };
        assert_eq!(describe_port(&info), "/dev/rfcomm0 (Bluetooth)");
    }

    #[test]
    fn test_open_missing_port_fails() {
        let mut connector = SerialConnector::new();
        let result = connector.open("/dev/blocklink-does-not-exist", &SerialConfig::default());
        assert!(result.is_err());
    }
}
