use std::collections::VecDeque;
use std::fmt;

use bytes::{BufMut, BytesMut};
use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::SerialLink;

type Responder = Box<dyn FnMut(&[u8]) -> Vec<u8>>;

/// In-memory [`SerialLink`].
///
/// Bytes queued with [`MemoryLink::push_incoming`] are what the host reads.
/// Everything the host writes is recorded and, when a responder is set,
/// handed to it; whatever the responder returns is queued as incoming data.
/// This is enough to stand in for a reader that answers one command with
/// an ACK frame followed by a response frame.
pub struct MemoryLink {
    incoming: VecDeque<u8>,
    written: BytesMut,
    responder: Option<Responder>,
    closed: bool,
}

impl MemoryLink {
    /// Create an empty link with no responder.
    pub fn new() -> Self {
        Self {
            incoming: VecDeque::new(),
            written: BytesMut::new(),
            responder: None,
            closed: false,
        }
    }

    /// Create a link with bytes already waiting to be read.
    pub fn with_incoming(bytes: &[u8]) -> Self {
        let mut link = Self::new();
        link.push_incoming(bytes);
        link
    }

    /// Install a responder invoked once per [`SerialLink::write_bytes`] call.
    pub fn with_responder(mut self, responder: impl FnMut(&[u8]) -> Vec<u8> + 'static) -> Self {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Queue bytes for the host to read.
    pub fn push_incoming(&mut self, bytes: &[u8]) {
        self.incoming.extend(bytes.iter().copied());
    }

    /// Bytes still waiting to be read.
    pub fn incoming_len(&self) -> usize {
        self.incoming.len()
    }

    /// Everything the host has written so far.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Drain and return everything the host has written so far.
    pub fn take_written(&mut self) -> Vec<u8> {
        self.written.split().to_vec()
    }

    /// Close the link; every later operation fails with `Disconnected`.
    pub fn close(&mut self) {
        self.closed = true;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(TransportError::Disconnected);
        }
        Ok(())
    }
}

impl Default for MemoryLink {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialLink for MemoryLink {
    fn bytes_available(&mut self) -> Result<usize> {
        self.ensure_open()?;
        Ok(self.incoming.len())
    }

    fn read_byte(&mut self) -> Result<u8> {
        self.ensure_open()?;
        self.incoming.pop_front().ok_or(TransportError::NoData)
    }

    fn write_bytes(&mut self, buf: &[u8]) -> Result<()> {
        self.ensure_open()?;
        trace!(len = buf.len(), "memory link write");
        self.written.put_slice(buf);
        if let Some(responder) = self.responder.as_mut() {
            let reply = responder(buf);
            self.incoming.extend(reply);
        }
        Ok(())
    }
}

impl fmt::Debug for MemoryLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryLink")
            .field("incoming", &self.incoming.len())
            .field("written", &self.written.len())
            .field("responder", &self.responder.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}
