//! NFC Port-400 (RC-S660/S) reader operations.
//!
//! [`NfcPort400`] owns a serial link and exposes the reader's commands:
//! firmware query, the transparent-session controls, and FeliCa Polling
//! over Transparent Exchange. Each call is a complete escape transaction;
//! retries are up to the caller.
//!
//! ```no_run
//! # #[cfg(feature = "serial")]
//! # fn main() -> nfcport_device::Result<()> {
//! use nfcport_device::{NfcPort400, PollingRequest};
//!
//! let mut reader = NfcPort400::open("/dev/ttyACM0", 115_200)?;
//! reader.open_felica()?;
//! let card = reader.felica_polling(&PollingRequest::default())?;
//! println!("IDm {}", card.idm_hex());
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "serial"))]
//! # fn main() {}
//! ```

pub mod apdu;
pub mod device;
pub mod error;
pub mod felica;
pub mod firmware;
pub mod session;
pub mod tlv;

pub use apdu::{Apdu, StatusWord};
pub use device::{DeviceConfig, NfcPort400};
pub use error::{DeviceError, Result};
pub use felica::{PollingRequest, PollingResponse, WILDCARD_SYSTEM_CODE};
pub use firmware::FirmwareVersion;
pub use session::SessionCommand;
pub use tlv::{find_tag, push_tlv, Tag, TlvEntries, TlvEntry};
