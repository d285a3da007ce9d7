use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use bytes::{Buf, BytesMut};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, trace};

use crate::error::{Result, TransportError};
use crate::traits::SerialLink;

const READ_CHUNK_SIZE: usize = 256;

/// UART link to the reader backed by the `serialport` crate.
///
/// The port is opened 8N1 without flow control. Bytes reported by the
/// driver are pulled in chunks and served one at a time from a local buffer.
pub struct SerialPortLink {
    port: Box<dyn SerialPort>,
    buf: BytesMut,
}

impl SerialPortLink {
    /// Baud rate the NFC Port-400 UART uses out of reset.
    pub const DEFAULT_BAUD_RATE: u32 = 115_200;

    /// Driver-level timeout for a single read or write syscall.
    const IO_TIMEOUT: Duration = Duration::from_millis(50);

    /// Open a serial device such as `/dev/ttyUSB0` or `COM3`.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Self::IO_TIMEOUT)
            .open()
            .map_err(|source| TransportError::Open {
                path: path.to_string(),
                source,
            })?;
        debug!(path, baud_rate, "serial port opened");
        Ok(Self::from_port(port))
    }

    /// Wrap an already-open port.
    pub fn from_port(port: Box<dyn SerialPort>) -> Self {
        Self {
            port,
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
        }
    }

    /// Device name reported by the driver, if any.
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }

    fn fill(&mut self) -> Result<()> {
        let pending = self.port.bytes_to_read()? as usize;
        if pending == 0 {
            return Ok(());
        }
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let want = pending.min(READ_CHUNK_SIZE);
        match self.port.read(&mut chunk[..want]) {
            Ok(0) => Err(TransportError::Disconnected),
            Ok(n) => {
                trace!(n, "serial read");
                self.buf.extend_from_slice(&chunk[..n]);
                Ok(())
            }
            Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => {
                Ok(())
            }
            Err(err) => Err(TransportError::Io(err)),
        }
    }
}

impl SerialLink for SerialPortLink {
    fn bytes_available(&mut self) -> Result<usize> {
        if self.buf.is_empty() {
            self.fill()?;
        }
        Ok(self.buf.len())
    }

    fn read_byte(&mut self) -> Result<u8> {
        if self.buf.is_empty() {
            self.fill()?;
        }
        if self.buf.is_empty() {
            return Err(TransportError::NoData);
        }
        Ok(self.buf.get_u8())
    }

    fn write_bytes(&mut self, buf: &[u8]) -> Result<()> {
        trace!(len = buf.len(), "serial write");
        self.port.write_all(buf)?;
        self.port.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for SerialPortLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortLink")
            .field("name", &self.port.name())
            .field("buffered", &self.buf.len())
            .finish()
    }
}
