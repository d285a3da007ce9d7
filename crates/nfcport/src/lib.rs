//! Driver for the Sony NFC Port-400 (RC-S660/S) over a serial link.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte link and clock capabilities (`SerialLink`, `Clock`)
//! - [`frame`]: host packet framing: checksums, resync, ACK frames
//! - [`ccid`]: `PC_to_RDR_Escape` envelopes and command transactions
//! - [`device`]: reader operations: firmware, sessions, FeliCa Polling
//!
//! The most used device types are re-exported at the crate root.

/// Re-export transport types.
pub mod transport {
    pub use nfcport_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use nfcport_frame::*;
}

/// Re-export escape-command types.
pub mod ccid {
    pub use nfcport_ccid::*;
}

/// Re-export device types.
pub mod device {
    pub use nfcport_device::*;
}

pub use nfcport_device::{
    DeviceConfig, DeviceError, FirmwareVersion, NfcPort400, PollingRequest, PollingResponse,
    SessionCommand, StatusWord,
};
