use std::time::Duration;

use nfcport_transport::TransportError;

/// Errors that can occur while reading or writing host packets.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// No frame start (`00 00 FF`) was seen before the deadline.
    #[error("timed out after {0:?} waiting for frame start")]
    Timeout(Duration),

    /// The frame started but the rest did not arrive before the deadline.
    #[error("short read in {stage}: received {received} of {expected} bytes before deadline")]
    ShortRead {
        stage: &'static str,
        expected: usize,
        received: usize,
    },

    /// The length checksum does not match the length field.
    #[error("length checksum mismatch (got 0x{got:02x}, expected 0x{expected:02x})")]
    LengthChecksum { got: u8, expected: u8 },

    /// The data checksum does not match the payload.
    #[error("data checksum mismatch (got 0x{got:02x}, expected 0x{expected:02x})")]
    DataChecksum { got: u8, expected: u8 },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The underlying link failed.
    #[error("link error: {0}")]
    Transport(#[from] TransportError),
}

impl FrameError {
    /// True for deadline failures (no frame start, or an incomplete frame).
    pub fn is_timeout(&self) -> bool {
        matches!(self, FrameError::Timeout(_) | FrameError::ShortRead { .. })
    }

    /// True for LCS or DCS mismatches.
    pub fn is_checksum(&self) -> bool {
        matches!(
            self,
            FrameError::LengthChecksum { .. } | FrameError::DataChecksum { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
