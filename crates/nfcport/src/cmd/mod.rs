use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use nfcport_device::{DeviceConfig, NfcPort400, SessionCommand};
use nfcport_transport::{SerialPortLink, SystemClock};
use tracing::debug;

use crate::exit::{transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod firmware;
pub mod poll;
pub mod session;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Query the reader's firmware versions.
    Firmware(FirmwareArgs),
    /// Poll for a FeliCa card and print its IDm/PMm.
    Poll(PollArgs),
    /// Send one session/control command.
    Session(SessionArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Firmware(args) => firmware::run(args, format),
        Command::Poll(args) => poll::run(args, format),
        Command::Session(args) => session::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Serial link and timeout options shared by device commands.
#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// Serial device the reader is attached to (e.g. /dev/ttyACM0, COM3).
    #[arg(long, env = "NFCPORT_PORT")]
    pub port: String,
    /// Baud rate.
    #[arg(long, default_value_t = SerialPortLink::DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Time to wait for the reader's ACK (e.g. 500ms, 1s).
    #[arg(long, default_value = "500ms")]
    pub ack_timeout: String,
    /// Time to wait for the response after the ACK (e.g. 500ms, 1s).
    #[arg(long, default_value = "1s")]
    pub response_timeout: String,
}

impl DeviceArgs {
    /// Timeouts from the command line. Session commands use the response
    /// timeout for both phases.
    pub fn config(&self) -> CliResult<DeviceConfig> {
        let ack_timeout = parse_duration(&self.ack_timeout)?;
        let response_timeout = parse_duration(&self.response_timeout)?;
        Ok(DeviceConfig {
            ack_timeout,
            response_timeout,
            session_timeout: response_timeout,
            ..DeviceConfig::default()
        })
    }

    pub fn open(&self) -> CliResult<NfcPort400<SerialPortLink>> {
        let config = self.config()?;
        let link = SerialPortLink::open(&self.port, self.baud)
            .map_err(|err| transport_error("open failed", err))?;
        debug!(port = %self.port, baud = self.baud, "reader link open");
        Ok(NfcPort400::with_config(link, SystemClock::default(), config))
    }
}

#[derive(Args, Debug)]
pub struct FirmwareArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Args, Debug)]
pub struct PollArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// System code in hex; FFFF matches any card.
    #[arg(long, default_value = "FFFF", value_parser = parse_system_code)]
    pub system_code: u16,
    /// Request code (0 none, 1 system code, 2 communication performance).
    #[arg(long, default_value_t = 0)]
    pub request_code: u8,
    /// Time slot number (0, 1, 3, 7 or 15).
    #[arg(long, default_value_t = 0)]
    pub time_slot: u8,
    /// Assume the transparent session and RF field are already set up.
    #[arg(long)]
    pub no_setup: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SessionAction {
    /// Start a transparent session.
    Start,
    /// End the transparent session.
    End,
    /// Turn the RF field on.
    RfOn,
    /// Turn the RF field off.
    RfOff,
    /// Switch the protocol to FeliCa.
    Felica,
}

impl From<SessionAction> for SessionCommand {
    fn from(action: SessionAction) -> Self {
        match action {
            SessionAction::Start => SessionCommand::StartTransparentSession,
            SessionAction::End => SessionCommand::EndTransparentSession,
            SessionAction::RfOn => SessionCommand::RfOn,
            SessionAction::RfOff => SessionCommand::RfOff,
            SessionAction::Felica => SessionCommand::SwitchToFelica,
        }
    }
}

#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Command to send.
    #[arg(value_enum)]
    pub action: SessionAction,
    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `500ms`, `2s` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else {
        (input.strip_suffix('s').unwrap_or(input), false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

/// Hex system code, with or without `0x`, at most four digits.
fn parse_system_code(input: &str) -> Result<u16, String> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    if digits.is_empty() || digits.len() > 4 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("expected 1-4 hex digits, got {input:?}"));
    }
    u16::from_str_radix(digits, 16).map_err(|err| format!("invalid system code {input:?}: {err}"))
}
