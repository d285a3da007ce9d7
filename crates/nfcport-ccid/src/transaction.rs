use std::time::Duration;

use bytes::{Bytes, BytesMut};
use nfcport_frame::{FrameConfig, FrameReader, FrameWriter, InboundFrame};
use nfcport_transport::{Clock, SerialLink};
use tracing::{debug, trace, warn};

use crate::envelope::{encode_command, EscapeResponse, DEFAULT_SEQUENCE, HEADER_SIZE};
use crate::error::{CcidError, FrameKind, Result};

/// Largest inner response a transaction hands back by default.
pub const DEFAULT_MAX_RESPONSE_LEN: usize = 240;

/// Timeouts and limits for one escape-command transaction.
#[derive(Debug, Clone)]
pub struct TransactionConfig {
    /// Time allowed for the reader's ACK after the command is written.
    pub ack_timeout: Duration,
    /// Time allowed for the response frame after the ACK.
    pub response_timeout: Duration,
    /// Sequence number placed in the command envelope.
    pub sequence: u8,
    /// Capacity of the caller's response buffer.
    pub max_response_len: usize,
}

impl TransactionConfig {
    /// Same timeout for the ACK and the response.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            ack_timeout: timeout,
            response_timeout: timeout,
            ..Self::default()
        }
    }

    /// Override the response capacity.
    pub fn max_response_len(mut self, max_response_len: usize) -> Self {
        self.max_response_len = max_response_len;
        self
    }
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_millis(500),
            response_timeout: Duration::from_millis(1000),
            sequence: DEFAULT_SEQUENCE,
            max_response_len: DEFAULT_MAX_RESPONSE_LEN,
        }
    }
}

/// Runs escape-command transactions over a link.
///
/// Holds the frame reader/writer and the envelope buffer so repeated
/// transactions reuse their allocations. The link and clock are passed per
/// call; whoever owns the link serializes access to it.
#[derive(Debug)]
pub struct CommandChannel {
    reader: FrameReader,
    writer: FrameWriter,
    buf: BytesMut,
}

impl CommandChannel {
    pub fn new() -> Self {
        Self::with_frame_config(FrameConfig::default())
    }

    pub fn with_frame_config(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(config.max_payload_size),
            reader: FrameReader::with_config(config.clone()),
            writer: FrameWriter::with_config(config),
        }
    }

    /// Send `command` in a `PC_to_RDR_Escape` envelope and return the
    /// reader's response bytes.
    ///
    /// Write command frame, read ACK, read response frame, validate the
    /// envelope. Any failure aborts the transaction; nothing partial is
    /// returned.
    pub fn execute<L, C>(
        &mut self,
        link: &mut L,
        clock: &C,
        command: &[u8],
        config: &TransactionConfig,
    ) -> Result<Bytes>
    where
        L: SerialLink + ?Sized,
        C: Clock + ?Sized,
    {
        self.buf.clear();
        encode_command(0, config.sequence, command, &mut self.buf);
        trace!(command = ?command, "escape command");
        self.writer.write_frame(link, &self.buf)?;

        match self.reader.read_frame(link, clock, config.ack_timeout)? {
            InboundFrame::Ack => {}
            InboundFrame::Data(_) => {
                warn!("data frame received while waiting for ACK");
                return Err(CcidError::UnexpectedFrame {
                    expected: FrameKind::Ack,
                    received: FrameKind::Data,
                });
            }
        }

        let payload = match self.reader.read_frame(link, clock, config.response_timeout)? {
            InboundFrame::Data(payload) => payload,
            InboundFrame::Ack => {
                warn!("second ACK received while waiting for response");
                return Err(CcidError::UnexpectedFrame {
                    expected: FrameKind::Data,
                    received: FrameKind::Ack,
                });
            }
        };

        let response = EscapeResponse::decode(payload)?;
        if response.data.len() > config.max_response_len {
            return Err(CcidError::BufferOverflow {
                size: response.data.len(),
                max: config.max_response_len,
            });
        }

        debug!(
            command_len = command.len(),
            response_len = response.data.len(),
            message_type = response.message_type,
            "escape transaction complete"
        );
        trace!(response = ?&response.data[..], "escape response");
        Ok(response.data)
    }

    /// Largest command that fits in one frame.
    pub fn max_command_len(&self) -> usize {
        self.writer
            .config()
            .max_payload_size
            .saturating_sub(HEADER_SIZE)
    }
}

impl Default for CommandChannel {
    fn default() -> Self {
        Self::new()
    }
}
