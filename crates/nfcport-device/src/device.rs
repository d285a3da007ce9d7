use std::time::Duration;

use bytes::{Bytes, BytesMut};
use nfcport_ccid::{CommandChannel, TransactionConfig};
use nfcport_frame::FrameConfig;
use nfcport_transport::{Clock, SerialLink, SystemClock};
use tracing::debug;

use crate::apdu::{Apdu, StatusWord};
use crate::error::Result;
use crate::felica::{self, PollingRequest, PollingResponse};
use crate::firmware::{self, FirmwareVersion};
use crate::session::SessionCommand;

/// Timeouts applied by the operations that do not take explicit ones.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Time allowed for the reader's ACK.
    pub ack_timeout: Duration,
    /// Time allowed for the response after the ACK.
    pub response_timeout: Duration,
    /// Single timeout used for both phases of session commands.
    pub session_timeout: Duration,
    pub frame: FrameConfig,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_millis(500),
            response_timeout: Duration::from_millis(1000),
            session_timeout: Duration::from_millis(1000),
            frame: FrameConfig::default(),
        }
    }
}

/// An NFC Port-400 reader on a serial link.
///
/// Owns the link. Every operation is one escape transaction (or, for
/// [`open_felica`](Self::open_felica), a fixed sequence of them) and
/// completes or fails before returning.
#[derive(Debug)]
pub struct NfcPort400<L, C = SystemClock> {
    link: L,
    clock: C,
    channel: CommandChannel,
    config: DeviceConfig,
    apdu: BytesMut,
}

#[cfg(feature = "serial")]
impl NfcPort400<nfcport_transport::SerialPortLink> {
    /// Open the reader on a serial device path.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let link = nfcport_transport::SerialPortLink::open(path, baud_rate)?;
        tracing::info!(path, baud_rate, "serial link open");
        Ok(Self::new(link))
    }
}

impl<L: SerialLink> NfcPort400<L> {
    pub fn new(link: L) -> Self {
        Self::with_clock(link, SystemClock::default())
    }
}

impl<L: SerialLink, C: Clock> NfcPort400<L, C> {
    pub fn with_clock(link: L, clock: C) -> Self {
        Self::with_config(link, clock, DeviceConfig::default())
    }

    pub fn with_config(link: L, clock: C, config: DeviceConfig) -> Self {
        Self {
            link,
            clock,
            channel: CommandChannel::with_frame_config(config.frame.clone()),
            config,
            apdu: BytesMut::new(),
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Release the link.
    pub fn into_inner(self) -> L {
        self.link
    }

    /// Run one escape transaction with `command` as the APDU.
    pub fn escape(&mut self, command: &[u8], config: &TransactionConfig) -> Result<Bytes> {
        Ok(self
            .channel
            .execute(&mut self.link, &self.clock, command, config)?)
    }

    fn execute(&mut self, apdu: &Apdu<'_>, config: &TransactionConfig) -> Result<Bytes> {
        self.apdu.clear();
        apdu.encode(&mut self.apdu)?;
        let command = self.apdu.split().freeze();
        self.escape(&command, config)
    }

    fn timeouts(&self, ack: Duration, response: Duration, max: usize) -> TransactionConfig {
        TransactionConfig {
            ack_timeout: ack,
            response_timeout: response,
            ..TransactionConfig::default()
        }
        .max_response_len(max)
    }

    /// Query the reader's firmware versions.
    pub fn firmware_version(&mut self) -> Result<FirmwareVersion> {
        let (ack, response) = (self.config.ack_timeout, self.config.response_timeout);
        self.firmware_version_with(ack, response)
    }

    pub fn firmware_version_with(
        &mut self,
        ack_timeout: Duration,
        response_timeout: Duration,
    ) -> Result<FirmwareVersion> {
        let config = self.timeouts(ack_timeout, response_timeout, firmware::MAX_RESPONSE_LEN);
        let response = self.execute(&firmware::command(), &config)?;
        let version = FirmwareVersion::parse(&response)?;
        debug!(
            overall = format_args!("{:08X}", version.overall_fw),
            status = %version.status_word(),
            "firmware version"
        );
        Ok(version)
    }

    /// Send a fixed control command using the session timeout.
    pub fn session(&mut self, command: SessionCommand) -> Result<StatusWord> {
        let timeout = self.config.session_timeout;
        self.session_with(command, timeout)
    }

    /// Send a fixed control command; `timeout` covers both the ACK and the
    /// response.
    pub fn session_with(
        &mut self,
        command: SessionCommand,
        timeout: Duration,
    ) -> Result<StatusWord> {
        let config = self.timeouts(timeout, timeout, command.max_response_len());
        let response = self.execute(&command.apdu(), &config)?;
        let sw = command.check_response(&response)?;
        debug!(command = command.name(), status = %sw, "session command");
        Ok(sw)
    }

    pub fn start_transparent_session(&mut self) -> Result<StatusWord> {
        self.session(SessionCommand::StartTransparentSession)
    }

    pub fn end_transparent_session(&mut self) -> Result<StatusWord> {
        self.session(SessionCommand::EndTransparentSession)
    }

    pub fn switch_to_felica(&mut self) -> Result<StatusWord> {
        self.session(SessionCommand::SwitchToFelica)
    }

    pub fn rf_on(&mut self) -> Result<StatusWord> {
        self.session(SessionCommand::RfOn)
    }

    pub fn rf_off(&mut self) -> Result<StatusWord> {
        self.session(SessionCommand::RfOff)
    }

    /// Start a transparent session, switch to FeliCa and turn the field on.
    ///
    /// Stops at the first failed transaction.
    pub fn open_felica(&mut self) -> Result<()> {
        for command in [
            SessionCommand::StartTransparentSession,
            SessionCommand::SwitchToFelica,
            SessionCommand::RfOn,
        ] {
            self.session(command)?;
        }
        Ok(())
    }

    /// Turn the field off and end the transparent session.
    pub fn close_felica(&mut self) -> Result<()> {
        self.session(SessionCommand::RfOff)?;
        self.session(SessionCommand::EndTransparentSession)?;
        Ok(())
    }

    /// Relay a raw card frame and return the card's answer.
    pub fn transceive(&mut self, card_command: &[u8]) -> Result<Bytes> {
        let (ack, response) = (self.config.ack_timeout, self.config.response_timeout);
        self.transceive_with(card_command, ack, response)
    }

    pub fn transceive_with(
        &mut self,
        card_command: &[u8],
        ack_timeout: Duration,
        response_timeout: Duration,
    ) -> Result<Bytes> {
        self.apdu.clear();
        felica::transparent_exchange_command(card_command, &mut self.apdu)?;
        let command = self.apdu.split().freeze();
        let config = self.timeouts(ack_timeout, response_timeout, felica::MAX_RESPONSE_LEN);
        let response = self.escape(&command, &config)?;
        let icc = felica::icc_response(&response)?;
        Ok(response.slice_ref(icc))
    }

    /// Poll for a FeliCa card.
    pub fn felica_polling(&mut self, request: &PollingRequest) -> Result<PollingResponse> {
        let (ack, response) = (self.config.ack_timeout, self.config.response_timeout);
        self.felica_polling_with(request, ack, response)
    }

    pub fn felica_polling_with(
        &mut self,
        request: &PollingRequest,
        ack_timeout: Duration,
        response_timeout: Duration,
    ) -> Result<PollingResponse> {
        let icc = self.transceive_with(&request.encode(), ack_timeout, response_timeout)?;
        let card = PollingResponse::parse(&icc)?;
        debug!(
            system_code = format_args!("{:04X}", request.system_code),
            idm = %card.idm_hex(),
            "card found"
        );
        Ok(card)
    }
}
