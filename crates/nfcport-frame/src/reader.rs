use std::time::{Duration, Instant};

use bytes::{BufMut, BytesMut};
use nfcport_transport::{Clock, SerialLink};
use tracing::{debug, trace, warn};

use crate::checksum::{data_checksum, length_checksum};
use crate::codec::{FrameConfig, InboundFrame};
use crate::error::{FrameError, Result};
use crate::sync::PreambleScanner;

/// Reads verified frames from a [`SerialLink`] against a deadline.
///
/// The deadline is fixed when [`FrameReader::read_frame`] is called and
/// covers the whole frame; it is not restarted for each field. Nothing is
/// carried over between calls.
#[derive(Debug)]
pub struct FrameReader {
    buf: BytesMut,
    config: FrameConfig,
}

impl FrameReader {
    /// Create a new frame reader with default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(config.max_payload_size),
            config,
        }
    }

    /// Read the next frame, waiting at most `timeout`.
    ///
    /// Scans for `00 00 FF`, then reads and verifies the length header,
    /// payload and checksums. Returns [`InboundFrame::Ack`] for the
    /// zero-length ACK packet.
    pub fn read_frame<L, C>(
        &mut self,
        link: &mut L,
        clock: &C,
        timeout: Duration,
    ) -> Result<InboundFrame>
    where
        L: SerialLink + ?Sized,
        C: Clock + ?Sized,
    {
        let deadline = Deadline::new(clock, timeout);

        self.sync(link, &deadline)?;

        let mut header = [0u8; 3];
        deadline.read_exact(link, &mut header, "length header")?;
        let len = u16::from_be_bytes([header[0], header[1]]);
        let lcs = header[2];

        if len == 0 && lcs == 0xFF {
            let mut postamble = [0u8; 1];
            deadline.read_exact(link, &mut postamble, "ack postamble")?;
            trace!("ack frame received");
            return Ok(InboundFrame::Ack);
        }

        let expected = length_checksum(len);
        if lcs != expected {
            warn!(len, lcs, expected, "length checksum mismatch");
            return Err(FrameError::LengthChecksum { got: lcs, expected });
        }

        let len = len as usize;
        if len > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: len,
                max: self.config.max_payload_size,
            });
        }

        self.buf.clear();
        self.buf.put_bytes(0, len);
        deadline.read_exact(link, &mut self.buf[..], "payload")?;

        let mut trailer = [0u8; 2];
        deadline.read_exact(link, &mut trailer, "checksum and postamble")?;
        let dcs = trailer[0];

        let expected = data_checksum(&self.buf);
        if dcs != expected {
            warn!(len, dcs, expected, "data checksum mismatch");
            return Err(FrameError::DataChecksum { got: dcs, expected });
        }

        debug!(len, "data frame received");
        Ok(InboundFrame::Data(self.buf.split().freeze()))
    }

    fn sync<L, C>(&self, link: &mut L, deadline: &Deadline<'_, C>) -> Result<()>
    where
        L: SerialLink + ?Sized,
        C: Clock + ?Sized,
    {
        let mut scanner = PreambleScanner::new();
        let mut skipped = 0usize;
        loop {
            match deadline.next_byte(link)? {
                Some(byte) => {
                    if scanner.push(byte) {
                        if skipped > 0 {
                            debug!(skipped, "resynchronized on frame start");
                        }
                        return Ok(());
                    }
                    skipped += 1;
                    // A link that never goes quiet must still honor the deadline.
                    if deadline.expired() {
                        return Err(FrameError::Timeout(deadline.timeout));
                    }
                }
                None => return Err(FrameError::Timeout(deadline.timeout)),
            }
        }
    }

    /// Update maximum payload size for subsequent reads.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

struct Deadline<'c, C: ?Sized> {
    clock: &'c C,
    at: Instant,
    timeout: Duration,
}

impl<'c, C: Clock + ?Sized> Deadline<'c, C> {
    fn new(clock: &'c C, timeout: Duration) -> Self {
        Self {
            clock,
            at: clock.now() + timeout,
            timeout,
        }
    }

    fn expired(&self) -> bool {
        self.clock.now() > self.at
    }

    /// Next byte from the link, or `None` once the deadline has passed.
    fn next_byte<L: SerialLink + ?Sized>(&self, link: &mut L) -> Result<Option<u8>> {
        loop {
            if link.bytes_available()? > 0 {
                return Ok(Some(link.read_byte()?));
            }
            if self.expired() {
                return Ok(None);
            }
            self.clock.pause();
        }
    }

    fn read_exact<L: SerialLink + ?Sized>(
        &self,
        link: &mut L,
        dst: &mut [u8],
        stage: &'static str,
    ) -> Result<()> {
        for (received, slot) in dst.iter_mut().enumerate() {
            match self.next_byte(link)? {
                Some(byte) => *slot = byte,
                None => {
                    return Err(FrameError::ShortRead {
                        stage,
                        expected: dst.len(),
                        received,
                    })
                }
            }
        }
        Ok(())
    }
}
