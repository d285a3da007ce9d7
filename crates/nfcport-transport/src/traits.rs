use crate::error::Result;

/// A byte-oriented, full-duplex link to the reader (typically a UART).
///
/// Reads are non-blocking by contract: callers poll [`bytes_available`]
/// and only call [`read_byte`] when it reports at least one byte. Waiting
/// and deadlines are the caller's concern (see [`crate::Clock`]).
///
/// [`bytes_available`]: SerialLink::bytes_available
/// [`read_byte`]: SerialLink::read_byte
pub trait SerialLink {
    /// Number of bytes that can be read right now without blocking.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read one byte. Only valid when [`SerialLink::bytes_available`] is non-zero.
    fn read_byte(&mut self) -> Result<u8>;

    /// Write the whole buffer to the link.
    fn write_bytes(&mut self, buf: &[u8]) -> Result<()>;
}

impl<T: SerialLink + ?Sized> SerialLink for &mut T {
    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn write_bytes(&mut self, buf: &[u8]) -> Result<()> {
        (**self).write_bytes(buf)
    }
}

impl<T: SerialLink + ?Sized> SerialLink for Box<T> {
    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn write_bytes(&mut self, buf: &[u8]) -> Result<()> {
        (**self).write_bytes(buf)
    }
}
