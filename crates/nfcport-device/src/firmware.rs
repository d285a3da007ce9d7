use crate::apdu::{Apdu, StatusWord, INS_GET_FIRMWARE_VERSION};
use crate::error::{DeviceError, Result};

/// Get Firmware Version: `FF 56 00 00 00`.
pub const GET_FIRMWARE_VERSION: [u8; 5] = [0xFF, INS_GET_FIRMWARE_VERSION, 0x00, 0x00, 0x00];

/// Shortest response accepted.
pub const MIN_RESPONSE_LEN: usize = 20;

/// Response capacity for the firmware query.
pub const MAX_RESPONSE_LEN: usize = 64;

/// Version fields reported by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    pub overall_fw: u32,
    pub mcu_fw: u16,
    pub sam_fw: u16,
    pub rffe_fw: u16,
    pub rffe_eeprom: u16,
    pub bootloader: u16,
    pub fw_update_state: u16,
    pub boot_state: u16,
    pub sw1: u8,
    pub sw2: u8,
}

impl FirmwareVersion {
    /// Decode a Get Firmware Version response.
    ///
    /// Fields sit at fixed big-endian offsets; the status word is always the
    /// last two bytes, however long the response is. The status word is
    /// recorded, not checked.
    pub fn parse(response: &[u8]) -> Result<Self> {
        if response.len() < MIN_RESPONSE_LEN {
            return Err(DeviceError::ResponseTooShort {
                operation: "firmware version",
                len: response.len(),
                min: MIN_RESPONSE_LEN,
            });
        }
        let u16_at = |at: usize| u16::from_be_bytes([response[at], response[at + 1]]);
        let n = response.len();

        Ok(Self {
            overall_fw: u32::from_be_bytes([response[0], response[1], response[2], response[3]]),
            mcu_fw: u16_at(4),
            sam_fw: u16_at(6),
            rffe_fw: u16_at(8),
            rffe_eeprom: u16_at(10),
            bootloader: u16_at(12),
            fw_update_state: u16_at(14),
            boot_state: u16_at(16),
            sw1: response[n - 2],
            sw2: response[n - 1],
        })
    }

    pub fn status_word(&self) -> StatusWord {
        StatusWord {
            sw1: self.sw1,
            sw2: self.sw2,
        }
    }

    /// True if the reader reports it is running its bootloader.
    pub fn in_bootloader(&self) -> bool {
        self.boot_state == 1
    }
}

pub(crate) fn command() -> Apdu<'static> {
    Apdu::new(INS_GET_FIRMWARE_VERSION, 0x00, 0x00)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> Vec<u8> {
        let mut response: Vec<u8> = (1..=len as u8).collect();
        let n = response.len();
        response[n - 2] = 0x90;
        response[n - 1] = 0x00;
        response
    }

    #[test]
    fn command_bytes() {
        assert_eq!(command().to_vec().unwrap(), GET_FIRMWARE_VERSION);
    }

    #[test]
    fn parses_fixed_offsets() {
        let response = sample(22);
        let fw = FirmwareVersion::parse(&response).unwrap();
        assert_eq!(fw.overall_fw, 0x0102_0304);
        assert_eq!(fw.mcu_fw, 0x0506);
        assert_eq!(fw.sam_fw, 0x0708);
        assert_eq!(fw.rffe_fw, 0x090A);
        assert_eq!(fw.rffe_eeprom, 0x0B0C);
        assert_eq!(fw.bootloader, 0x0D0E);
        assert_eq!(fw.fw_update_state, 0x0F10);
        assert_eq!(fw.boot_state, 0x1112);
        assert_eq!((fw.sw1, fw.sw2), (0x90, 0x00));
        assert!(fw.status_word().is_success());
    }

    #[test]
    fn status_word_is_last_two_bytes() {
        let mut response = sample(40);
        let n = response.len();
        response[n - 2] = 0x6F;
        response[n - 1] = 0x01;
        let fw = FirmwareVersion::parse(&response).unwrap();
        assert_eq!((fw.sw1, fw.sw2), (0x6F, 0x01));
        assert_eq!(fw.overall_fw, 0x0102_0304);
    }

    #[test]
    fn minimum_length() {
        assert!(FirmwareVersion::parse(&sample(20)).is_ok());
        let err = FirmwareVersion::parse(&sample(19)).unwrap_err();
        assert!(matches!(
            err,
            DeviceError::ResponseTooShort { len: 19, min: 20, .. }
        ));
        assert!(FirmwareVersion::parse(&[]).is_err());
    }

    #[test]
    fn bootloader_state() {
        let mut response = sample(20);
        response[16] = 0x00;
        response[17] = 0x01;
        assert!(FirmwareVersion::parse(&response).unwrap().in_bootloader());
        response[17] = 0x00;
        assert!(!FirmwareVersion::parse(&response).unwrap().in_bootloader());
    }
}
