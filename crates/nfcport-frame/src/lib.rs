//! Checksum-verified host-packet framing for the NFC Port-400 UART protocol.
//!
//! Every packet exchanged with the reader is framed as:
//! - a preamble byte and a 2-byte start code (`00 00 FF`) for resynchronization
//! - a 2-byte big-endian payload length and its length checksum (LCS)
//! - the payload, its data checksum (DCS) and a postamble byte
//!
//! The zero-length packet `00 00 FF 00 00 FF 00` is the ACK the reader sends
//! before every response. Frames are never retained: a read either returns
//! a complete, verified frame or fails and leaves the link at whatever byte
//! it stopped on, so the next read simply resumes preamble scanning.

pub mod checksum;
pub mod codec;
pub mod error;
pub mod reader;
pub mod sync;
pub mod writer;

pub use checksum::{data_checksum, length_checksum};
pub use codec::{
    decode_frame, encode_frame, FrameConfig, InboundFrame, ACK_FRAME, DEFAULT_MAX_PAYLOAD,
    FRAME_OVERHEAD, POSTAMBLE, PREAMBLE, START_CODE,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use sync::{PreambleScanner, Scan, ScanState};
pub use writer::FrameWriter;
