use bytes::BytesMut;
use nfcport_transport::SerialLink;
use tracing::{debug, trace};

use crate::codec::{encode_frame, FrameConfig, FRAME_OVERHEAD};
use crate::error::{FrameError, Result};

/// Writes complete frames to a [`SerialLink`].
///
/// Each frame is encoded into an internal buffer and handed to the link as
/// a single write. No acknowledgement is awaited here.
#[derive(Debug)]
pub struct FrameWriter {
    buf: BytesMut,
    config: FrameConfig,
}

impl FrameWriter {
    /// Create a new frame writer with default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(FRAME_OVERHEAD + config.max_payload_size),
            config,
        }
    }

    /// Encode and send a payload.
    pub fn write_frame<L>(&mut self, link: &mut L, payload: &[u8]) -> Result<()>
    where
        L: SerialLink + ?Sized,
    {
        if payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }

        self.buf.clear();
        encode_frame(payload, &mut self.buf)?;
        trace!(frame = ?&self.buf[..], "writing frame");

        link.write_bytes(&self.buf)?;
        debug!(len = payload.len(), "data frame sent");
        Ok(())
    }

    /// Update maximum payload size for subsequent frames.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl Default for FrameWriter {
    fn default() -> Self {
        Self::new()
    }
}
