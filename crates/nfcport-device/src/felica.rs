//! FeliCa Polling over Transparent Exchange.
//!
//! A card command travels in a Transceive data object (`95`) inside the
//! Transparent Exchange APDU `FF C2 00 01`. The card's answer comes back in
//! an ICC Response data object (`97`) followed by the status word.

use bytes::BytesMut;

use crate::apdu::{tag, Apdu, StatusWord, INS_TRANSPARENT, P2_TRANSPARENT_EXCHANGE};
use crate::error::{DeviceError, Result};
use crate::tlv::{find_tag, push_tlv};

pub const POLLING_COMMAND: u8 = 0x00;
pub const POLLING_RESPONSE: u8 = 0x01;

/// System code matching any card.
pub const WILDCARD_SYSTEM_CODE: u16 = 0xFFFF;

/// Request code values.
pub const REQUEST_NONE: u8 = 0x00;
pub const REQUEST_SYSTEM_CODE: u8 = 0x01;
pub const REQUEST_COMMUNICATION_PERFORMANCE: u8 = 0x02;

/// Shortest Polling response: length, code, IDm, PMm.
pub const MIN_POLLING_RESPONSE_LEN: usize = 18;

/// Response capacity for Transparent Exchange.
pub const MAX_RESPONSE_LEN: usize = 128;

/// Largest card command one Transceive object carries; the object and its
/// two header bytes must fit a short APDU's `Lc`.
pub const MAX_CARD_COMMAND_LEN: usize = 253;

/// Polling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingRequest {
    pub system_code: u16,
    pub request_code: u8,
    pub time_slot: u8,
}

impl PollingRequest {
    pub fn new(system_code: u16) -> Self {
        Self {
            system_code,
            ..Self::default()
        }
    }

    pub fn request_code(mut self, request_code: u8) -> Self {
        self.request_code = request_code;
        self
    }

    pub fn time_slot(mut self, time_slot: u8) -> Self {
        self.time_slot = time_slot;
        self
    }

    /// Card frame: `[LEN=06, 00, SC_H, SC_L, request_code, time_slot]`.
    pub fn encode(&self) -> [u8; 6] {
        let [hi, lo] = self.system_code.to_be_bytes();
        [6, POLLING_COMMAND, hi, lo, self.request_code, self.time_slot]
    }
}

impl Default for PollingRequest {
    fn default() -> Self {
        Self {
            system_code: WILDCARD_SYSTEM_CODE,
            request_code: REQUEST_NONE,
            time_slot: 0,
        }
    }
}

/// Card identity returned by Polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingResponse {
    /// Manufacture ID.
    pub idm: [u8; 8],
    /// Manufacture parameter.
    pub pmm: [u8; 8],
    /// Two bytes answering the request code, when the card sent them.
    pub request_data: Option<[u8; 2]>,
}

impl PollingResponse {
    /// Decode the ICC Response value of a Polling exchange.
    pub fn parse(icc: &[u8]) -> Result<Self> {
        if icc.len() < MIN_POLLING_RESPONSE_LEN {
            return Err(DeviceError::ResponseTooShort {
                operation: "polling",
                len: icc.len(),
                min: MIN_POLLING_RESPONSE_LEN,
            });
        }
        if icc[1] != POLLING_RESPONSE {
            return Err(DeviceError::UnexpectedResponseCode {
                expected: POLLING_RESPONSE,
                got: icc[1],
            });
        }

        let mut idm = [0u8; 8];
        let mut pmm = [0u8; 8];
        idm.copy_from_slice(&icc[2..10]);
        pmm.copy_from_slice(&icc[10..18]);
        let request_data = icc.get(18..20).map(|rd| [rd[0], rd[1]]);

        Ok(Self {
            idm,
            pmm,
            request_data,
        })
    }

    /// IDm as uppercase hex.
    pub fn idm_hex(&self) -> String {
        hex(&self.idm)
    }

    /// PMm as uppercase hex.
    pub fn pmm_hex(&self) -> String {
        hex(&self.pmm)
    }
}

pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

/// Build the Transparent Exchange APDU carrying `card_command`.
pub fn transparent_exchange_command(card_command: &[u8], dst: &mut BytesMut) -> Result<()> {
    if card_command.len() > MAX_CARD_COMMAND_LEN {
        return Err(DeviceError::DataTooLong {
            len: card_command.len(),
            max: MAX_CARD_COMMAND_LEN,
        });
    }
    let mut data = BytesMut::with_capacity(2 + card_command.len());
    push_tlv(&mut data, tag::TRANSCEIVE, card_command)?;
    Apdu::new(INS_TRANSPARENT, 0x00, P2_TRANSPARENT_EXCHANGE)
        .data(&data)
        .encode(dst)
}

/// Check the status word of a Transparent Exchange response and return the
/// ICC Response value.
pub fn icc_response(response: &[u8]) -> Result<&[u8]> {
    let (body, sw) = StatusWord::split(response).ok_or(DeviceError::ResponseTooShort {
        operation: "transparent exchange",
        len: response.len(),
        min: 2,
    })?;
    sw.check()?;
    find_tag(body, tag::ICC_RESPONSE).ok_or(DeviceError::TlvNotFound {
        tag: tag::ICC_RESPONSE,
    })
}
