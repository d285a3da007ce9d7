//! CCID escape-command transactions over NFC Port-400 host packets.
//!
//! Application commands (APDUs) travel inside a `PC_to_RDR_Escape` envelope
//! carried by one host packet. A transaction writes that packet, waits for
//! the reader's ACK, then for the response packet, validates the
//! `RDR_to_PC_*` envelope and yields the inner response bytes.
//!
//! One transaction is in flight at a time; the link has a single owner.

pub mod envelope;
pub mod error;
pub mod sim;
pub mod transaction;

pub use envelope::{
    EscapeCommand, EscapeResponse, ACCEPTED_RESPONSE_TYPES, DEFAULT_SEQUENCE, HEADER_SIZE,
    PC_TO_RDR_ESCAPE, RDR_TO_PC_DATA_BLOCK, RDR_TO_PC_ESCAPE, RDR_TO_PC_SLOT_STATUS,
};
pub use error::{CcidError, FrameKind, Result};
pub use sim::{CommandLog, SimulatedReader};
pub use transaction::{CommandChannel, TransactionConfig, DEFAULT_MAX_RESPONSE_LEN};
