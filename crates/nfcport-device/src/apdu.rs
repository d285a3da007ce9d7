//! Proprietary reader APDUs (class `0xFF`) and status-word handling.

use bytes::{BufMut, BytesMut};

use crate::error::{DeviceError, Result};

pub const CLA_PROPRIETARY: u8 = 0xFF;

/// Get Firmware Version.
pub const INS_GET_FIRMWARE_VERSION: u8 = 0x56;

/// Manage Session, Transparent Exchange and Switch Protocol share this
/// instruction and differ in P2.
pub const INS_TRANSPARENT: u8 = 0xC2;

pub const P2_MANAGE_SESSION: u8 = 0x00;
pub const P2_TRANSPARENT_EXCHANGE: u8 = 0x01;
pub const P2_SWITCH_PROTOCOL: u8 = 0x02;

/// Data object tags used inside Transparent APDUs.
pub mod tag {
    pub const START_TRANSPARENT_SESSION: u8 = 0x81;
    pub const END_TRANSPARENT_SESSION: u8 = 0x82;
    pub const TURN_OFF_RF: u8 = 0x83;
    pub const TURN_ON_RF: u8 = 0x84;
    pub const SWITCH_PROTOCOL: u8 = 0x8F;
    pub const TRANSCEIVE: u8 = 0x95;
    pub const ICC_RESPONSE: u8 = 0x97;
}

/// Switch Protocol value selecting FeliCa (layer 3).
pub const PROTOCOL_FELICA: [u8; 2] = [0x03, 0x00];

/// Largest `Lc` a short APDU can carry.
pub const MAX_SHORT_LC: usize = u8::MAX as usize;

/// Short APDU with `Le = 00`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apdu<'a> {
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: &'a [u8],
}

impl<'a> Apdu<'a> {
    pub fn new(ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            ins,
            p1,
            p2,
            data: &[],
        }
    }

    pub fn data(mut self, data: &'a [u8]) -> Self {
        self.data = data;
        self
    }

    /// `CLA INS P1 P2 [Lc data] Le`. `Lc` is omitted when there is no data.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        if self.data.len() > MAX_SHORT_LC {
            return Err(DeviceError::DataTooLong {
                len: self.data.len(),
                max: MAX_SHORT_LC,
            });
        }
        dst.reserve(6 + self.data.len());
        dst.put_slice(&[CLA_PROPRIETARY, self.ins, self.p1, self.p2]);
        if !self.data.is_empty() {
            dst.put_u8(self.data.len() as u8);
            dst.put_slice(self.data);
        }
        dst.put_u8(0x00);
        Ok(())
    }

    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::new();
        self.encode(&mut buf)?;
        Ok(buf.to_vec())
    }
}

/// Trailing status bytes of an APDU response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusWord {
    pub sw1: u8,
    pub sw2: u8,
}

impl StatusWord {
    pub const SUCCESS: StatusWord = StatusWord {
        sw1: 0x90,
        sw2: 0x00,
    };

    /// Split `response` into body and status word.
    pub fn split(response: &[u8]) -> Option<(&[u8], StatusWord)> {
        let (body, sw) = response.split_last_chunk::<2>()?;
        Some((
            body,
            StatusWord {
                sw1: sw[0],
                sw2: sw[1],
            },
        ))
    }

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// `Ok(())` for `90 00`, the status word as an error otherwise.
    pub fn check(self) -> Result<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(DeviceError::StatusWord {
                sw1: self.sw1,
                sw2: self.sw2,
            })
        }
    }
}

impl std::fmt::Display for StatusWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02X}{:02X}", self.sw1, self.sw2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firmware_apdu_has_no_lc() {
        let apdu = Apdu::new(INS_GET_FIRMWARE_VERSION, 0x00, 0x00).to_vec().unwrap();
        assert_eq!(apdu, [0xFF, 0x56, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn data_apdu_carries_lc_and_le() {
        let apdu = Apdu::new(INS_TRANSPARENT, 0x00, P2_MANAGE_SESSION)
            .data(&[tag::START_TRANSPARENT_SESSION, 0x00])
            .to_vec()
            .unwrap();
        assert_eq!(apdu, [0xFF, 0xC2, 0x00, 0x00, 0x02, 0x81, 0x00, 0x00]);
    }

    #[test]
    fn rejects_oversized_data() {
        let data = [0u8; 256];
        let err = Apdu::new(INS_TRANSPARENT, 0x00, P2_TRANSPARENT_EXCHANGE)
            .data(&data)
            .to_vec()
            .unwrap_err();
        assert!(matches!(err, DeviceError::DataTooLong { len: 256, max: 255 }));
    }

    #[test]
    fn status_word_split() {
        let (body, sw) = StatusWord::split(&[0x01, 0x02, 0x90, 0x00]).unwrap();
        assert_eq!(body, &[0x01, 0x02]);
        assert!(sw.is_success());
        assert!(StatusWord::split(&[0x90]).is_none());

        let (body, sw) = StatusWord::split(&[0x6A, 0x81]).unwrap();
        assert!(body.is_empty());
        assert_eq!(sw.to_string(), "6A81");
        assert!(matches!(
            sw.check(),
            Err(DeviceError::StatusWord { sw1: 0x6A, sw2: 0x81 })
        ));
    }
}
