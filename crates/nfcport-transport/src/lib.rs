//! Byte-stream link and clock capabilities for the NFC Port-400 host protocol.
//!
//! This is the lowest layer of nfcport. The protocol layers above only ever
//! see a [`SerialLink`] (non-blocking byte availability, single-byte reads,
//! whole-buffer writes) and a [`Clock`] (monotonic time plus a yield point).
//!
//! - [`MemoryLink`]: in-memory link with an optional scripted responder
//! - [`SerialPortLink`]: UART link backed by the `serialport` crate
//!   (behind the `serial` feature)

pub mod clock;
pub mod error;
pub mod memory;
pub mod traits;

#[cfg(feature = "serial")]
pub mod serial;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, TransportError};
pub use memory::MemoryLink;
pub use traits::SerialLink;

#[cfg(feature = "serial")]
pub use serial::SerialPortLink;
