use std::fmt;

use nfcport_frame::FrameError;

/// Kind of frame a transaction step was waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Ack,
    Data,
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameKind::Ack => f.write_str("ACK frame"),
            FrameKind::Data => f.write_str("data frame"),
        }
    }
}

/// Errors that can occur during an escape-command transaction.
#[derive(Debug, thiserror::Error)]
pub enum CcidError {
    /// Frame-level error (timeout, checksum, link).
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// An ACK arrived where a data frame was expected, or vice versa.
    #[error("expected {expected}, received {received}")]
    UnexpectedFrame {
        expected: FrameKind,
        received: FrameKind,
    },

    /// The response envelope is too short, has an unknown message type,
    /// or declares more data than was received.
    #[error("malformed response envelope: {0}")]
    EnvelopeMalformed(String),

    /// The reader reported a command failure in the envelope status bytes.
    #[error("reader status error (bStatus 0x{status:02x}, bError 0x{error:02x})")]
    DeviceStatus { status: u8, error: u8 },

    /// The response does not fit the caller's buffer.
    #[error("response too large ({size} bytes, max {max})")]
    BufferOverflow { size: usize, max: usize },
}

impl CcidError {
    /// True if the transaction failed because a deadline passed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CcidError::Frame(err) if err.is_timeout())
    }
}

pub type Result<T> = std::result::Result<T, CcidError>;
