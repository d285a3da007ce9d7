use tracing::warn;

use crate::apdu::{
    tag, Apdu, StatusWord, INS_TRANSPARENT, P2_MANAGE_SESSION, P2_SWITCH_PROTOCOL,
    PROTOCOL_FELICA,
};
use crate::error::{DeviceError, Result};

/// Response capacity for Manage Session commands.
pub const MAX_RESPONSE_LEN: usize = 32;

/// Response capacity for Switch Protocol.
pub const MAX_SWITCH_RESPONSE_LEN: usize = 64;

/// Fixed control commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionCommand {
    StartTransparentSession,
    EndTransparentSession,
    SwitchToFelica,
    RfOn,
    RfOff,
}

impl SessionCommand {
    pub const ALL: [SessionCommand; 5] = [
        SessionCommand::StartTransparentSession,
        SessionCommand::EndTransparentSession,
        SessionCommand::SwitchToFelica,
        SessionCommand::RfOn,
        SessionCommand::RfOff,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SessionCommand::StartTransparentSession => "start transparent session",
            SessionCommand::EndTransparentSession => "end transparent session",
            SessionCommand::SwitchToFelica => "switch to FeliCa",
            SessionCommand::RfOn => "RF on",
            SessionCommand::RfOff => "RF off",
        }
    }

    pub(crate) fn apdu(self) -> Apdu<'static> {
        static START: [u8; 2] = [tag::START_TRANSPARENT_SESSION, 0x00];
        static END: [u8; 2] = [tag::END_TRANSPARENT_SESSION, 0x00];
        static RF_ON: [u8; 2] = [tag::TURN_ON_RF, 0x00];
        static RF_OFF: [u8; 2] = [tag::TURN_OFF_RF, 0x00];
        static FELICA: [u8; 4] = [
            tag::SWITCH_PROTOCOL,
            0x02,
            PROTOCOL_FELICA[0],
            PROTOCOL_FELICA[1],
        ];

        let manage = Apdu::new(INS_TRANSPARENT, 0x00, P2_MANAGE_SESSION);
        match self {
            SessionCommand::StartTransparentSession => manage.data(&START),
            SessionCommand::EndTransparentSession => manage.data(&END),
            SessionCommand::RfOn => manage.data(&RF_ON),
            SessionCommand::RfOff => manage.data(&RF_OFF),
            SessionCommand::SwitchToFelica => {
                Apdu::new(INS_TRANSPARENT, 0x00, P2_SWITCH_PROTOCOL).data(&FELICA)
            }
        }
    }

    pub(crate) fn max_response_len(self) -> usize {
        match self {
            SessionCommand::SwitchToFelica => MAX_SWITCH_RESPONSE_LEN,
            _ => MAX_RESPONSE_LEN,
        }
    }

    /// Check a response: at least the status word must be present. A
    /// non-success status is reported but accepted.
    pub fn check_response(self, response: &[u8]) -> Result<StatusWord> {
        let (_, sw) = StatusWord::split(response).ok_or(DeviceError::ResponseTooShort {
            operation: self.name(),
            len: response.len(),
            min: 2,
        })?;
        if !sw.is_success() {
            warn!(command = self.name(), status = %sw, "reader returned non-success status");
        }
        Ok(sw)
    }
}

impl std::fmt::Display for SessionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(cmd: SessionCommand) -> Vec<u8> {
        cmd.apdu().to_vec().unwrap()
    }

    #[test]
    fn fixed_command_bytes() {
        assert_eq!(
            bytes(SessionCommand::StartTransparentSession),
            [0xFF, 0xC2, 0x00, 0x00, 0x02, 0x81, 0x00, 0x00]
        );
        assert_eq!(
            bytes(SessionCommand::EndTransparentSession),
            [0xFF, 0xC2, 0x00, 0x00, 0x02, 0x82, 0x00, 0x00]
        );
        assert_eq!(
            bytes(SessionCommand::SwitchToFelica),
            [0xFF, 0xC2, 0x00, 0x02, 0x04, 0x8F, 0x02, 0x03, 0x00, 0x00]
        );
        assert_eq!(
            bytes(SessionCommand::RfOn),
            [0xFF, 0xC2, 0x00, 0x00, 0x02, 0x84, 0x00, 0x00]
        );
        assert_eq!(
            bytes(SessionCommand::RfOff),
            [0xFF, 0xC2, 0x00, 0x00, 0x02, 0x83, 0x00, 0x00]
        );
    }

    #[test]
    fn accepts_any_status_word() {
        let cmd = SessionCommand::RfOn;
        assert!(cmd.check_response(&[0x90, 0x00]).unwrap().is_success());
        let sw = cmd.check_response(&[0xC0, 0x03, 0x00, 0x90, 0x00, 0x6A, 0x81]).unwrap();
        assert_eq!(sw, StatusWord { sw1: 0x6A, sw2: 0x81 });
    }

    #[test]
    fn requires_status_word() {
        let err = SessionCommand::EndTransparentSession
            .check_response(&[0x90])
            .unwrap_err();
        assert!(matches!(err, DeviceError::ResponseTooShort { len: 1, min: 2, .. }));
    }

    #[test]
    fn switch_has_larger_capacity() {
        assert_eq!(SessionCommand::SwitchToFelica.max_response_len(), 64);
        assert_eq!(SessionCommand::RfOff.max_response_len(), 32);
    }
}
