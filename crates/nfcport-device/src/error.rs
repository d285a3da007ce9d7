use nfcport_ccid::CcidError;
use nfcport_transport::TransportError;

/// Errors returned by reader operations.
///
/// Every operation either succeeds or fails with one of these; callers that
/// only need "did it work" can treat any `Err` the same way.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The link could not be opened.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The escape-command transaction failed.
    #[error("transaction failed: {0}")]
    Ccid(#[from] CcidError),

    /// The response is shorter than the operation requires.
    #[error("{operation} response too short ({len} bytes, need {min})")]
    ResponseTooShort {
        operation: &'static str,
        len: usize,
        min: usize,
    },

    /// The APDU status word is not `90 00`.
    #[error("status word {sw1:02X} {sw2:02X}")]
    StatusWord { sw1: u8, sw2: u8 },

    /// The expected TLV tag is absent or truncated.
    #[error("TLV tag 0x{tag:02x} not found")]
    TlvNotFound { tag: u8 },

    /// The card answered with a different response code.
    #[error("unexpected response code 0x{got:02x} (expected 0x{expected:02x})")]
    UnexpectedResponseCode { expected: u8, got: u8 },

    /// A data object does not fit its one-byte length field.
    #[error("data too long ({len} bytes, max {max})")]
    DataTooLong { len: usize, max: usize },
}

impl DeviceError {
    /// True if the operation failed because a deadline passed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, DeviceError::Ccid(err) if err.is_timeout())
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;
