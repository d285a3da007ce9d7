//! Preamble acquisition.
//!
//! The scanner walks the byte stream looking for `00 00 FF`. It is a pure
//! state machine so the reader, the buffer decoder and the tests all share
//! one definition of "frame start".

/// Where the scanner is in the `00 00 FF` pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    /// Nothing matched yet.
    #[default]
    WaitPreamble,
    /// Seen the preamble `00`, waiting for the first start-code byte `00`.
    WaitStartByte1,
    /// Seen `00 00`, waiting for `FF`.
    WaitStartByte2,
}

/// Outcome of feeding one byte to the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// The pattern is not complete yet.
    Pending(ScanState),
    /// `00 00 FF` was just completed.
    Found,
}

impl ScanState {
    /// Transition on one input byte.
    ///
    /// A run of zeros longer than two keeps the scanner at
    /// `WaitStartByte2`: the last two zeros still form a valid prefix.
    pub fn advance(self, byte: u8) -> Scan {
        match (self, byte) {
            (ScanState::WaitPreamble, 0x00) => Scan::Pending(ScanState::WaitStartByte1),
            (ScanState::WaitPreamble, _) => Scan::Pending(ScanState::WaitPreamble),
            (ScanState::WaitStartByte1, 0x00) => Scan::Pending(ScanState::WaitStartByte2),
            (ScanState::WaitStartByte1, _) => Scan::Pending(ScanState::WaitPreamble),
            (ScanState::WaitStartByte2, 0xFF) => Scan::Found,
            (ScanState::WaitStartByte2, 0x00) => Scan::Pending(ScanState::WaitStartByte2),
            (ScanState::WaitStartByte2, _) => Scan::Pending(ScanState::WaitPreamble),
        }
    }

    /// Number of trailing bytes already matched.
    pub fn matched(self) -> usize {
        match self {
            ScanState::WaitPreamble => 0,
            ScanState::WaitStartByte1 => 1,
            ScanState::WaitStartByte2 => 2,
        }
    }
}

/// Stateful wrapper around [`ScanState`].
#[derive(Debug, Clone, Default)]
pub struct PreambleScanner {
    state: ScanState,
}

impl PreambleScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte. Returns `true` when it completes `00 00 FF`;
    /// the scanner is then reset for the next frame.
    pub fn push(&mut self, byte: u8) -> bool {
        match self.state.advance(byte) {
            Scan::Found => {
                self.state = ScanState::WaitPreamble;
                true
            }
            Scan::Pending(next) => {
                self.state = next;
                false
            }
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = ScanState::WaitPreamble;
    }
}
