use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CcidError, Result};

/// `PC_to_RDR_Escape` message type.
pub const PC_TO_RDR_ESCAPE: u8 = 0x6B;

/// `RDR_to_PC_Escape` message type, the expected answer to an escape command.
pub const RDR_TO_PC_ESCAPE: u8 = 0x83;

/// `RDR_to_PC_DataBlock` message type.
pub const RDR_TO_PC_DATA_BLOCK: u8 = 0x80;

/// `RDR_to_PC_SlotStatus` message type.
pub const RDR_TO_PC_SLOT_STATUS: u8 = 0x81;

/// Response message types accepted for an escape command.
pub const ACCEPTED_RESPONSE_TYPES: [u8; 3] =
    [RDR_TO_PC_ESCAPE, RDR_TO_PC_DATA_BLOCK, RDR_TO_PC_SLOT_STATUS];

/// Envelope header: type (1) + length (4 LE) + slot (1) + seq (1) + 3 bytes.
pub const HEADER_SIZE: usize = 10;

/// Sequence number used for every command.
pub const DEFAULT_SEQUENCE: u8 = 0x01;

/// `bStatus` bits 6-7 carry the command status; any bit set is a failure.
const COMMAND_STATUS_MASK: u8 = 0xC0;

/// Outbound `PC_to_RDR_Escape` envelope.
///
/// ```text
/// ┌──────┬──────────┬──────┬─────┬─────────┬──────────────┐
/// │ 6B   │ dwLength │ Slot │ Seq │ RFU (3) │ Command      │
/// │      │ (4B LE)  │      │     │         │ (dwLength B) │
/// └──────┴──────────┴──────┴─────┴─────────┴──────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeCommand {
    pub slot: u8,
    pub sequence: u8,
    pub data: Bytes,
}

impl EscapeCommand {
    /// Command for slot 0 with the given sequence number.
    pub fn new(sequence: u8, data: impl Into<Bytes>) -> Self {
        Self {
            slot: 0,
            sequence,
            data: data.into(),
        }
    }

    /// Encoded size in bytes.
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.data.len()
    }

    /// Append the envelope to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        encode_command(self.slot, self.sequence, &self.data, dst);
    }

    /// Parse an escape envelope (the reader's side of the exchange).
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let (header, data) = split_header(payload)?;
        if header.message_type != PC_TO_RDR_ESCAPE {
            return Err(CcidError::EnvelopeMalformed(format!(
                "message type 0x{:02x} is not PC_to_RDR_Escape",
                header.message_type
            )));
        }
        Ok(Self {
            slot: header.slot,
            sequence: header.sequence,
            data: Bytes::copy_from_slice(data),
        })
    }
}

/// Append a slot-`slot` escape envelope around `data` without copying it first.
pub(crate) fn encode_command(slot: u8, sequence: u8, data: &[u8], dst: &mut BytesMut) {
    dst.reserve(HEADER_SIZE + data.len());
    dst.put_u8(PC_TO_RDR_ESCAPE);
    dst.put_u32_le(data.len() as u32);
    dst.put_u8(slot);
    dst.put_u8(sequence);
    dst.put_bytes(0, 3);
    dst.put_slice(data);
}

/// Inbound `RDR_to_PC_*` envelope.
///
/// ```text
/// ┌──────┬──────────┬──────┬─────┬─────────┬────────┬─────┬───────────────┐
/// │ Type │ dwLength │ Slot │ Seq │ bStatus │ bError │ RFU │ Response      │
/// │      │ (4B LE)  │      │     │         │        │     │ (dwLength B)  │
/// └──────┴──────────┴──────┴─────┴─────────┴────────┴─────┴───────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeResponse {
    pub message_type: u8,
    pub slot: u8,
    pub sequence: u8,
    pub status: u8,
    pub error: u8,
    pub data: Bytes,
}

impl EscapeResponse {
    /// Successful `RDR_to_PC_Escape` carrying `data`.
    pub fn ok(sequence: u8, data: impl Into<Bytes>) -> Self {
        Self {
            message_type: RDR_TO_PC_ESCAPE,
            slot: 0,
            sequence,
            status: 0,
            error: 0,
            data: data.into(),
        }
    }

    /// Append the envelope to `dst` (the reader's side of the exchange).
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(HEADER_SIZE + self.data.len());
        dst.put_u8(self.message_type);
        dst.put_u32_le(self.data.len() as u32);
        dst.put_u8(self.slot);
        dst.put_u8(self.sequence);
        dst.put_u8(self.status);
        dst.put_u8(self.error);
        dst.put_u8(0);
        dst.put_slice(&self.data);
    }

    /// Validate and parse a response envelope.
    ///
    /// Checks, in order: minimum size, message type, status and error
    /// bytes, then that the declared length fits in what was received.
    /// Trailing bytes past the declared length are ignored.
    pub fn decode(payload: Bytes) -> Result<Self> {
        if payload.len() < HEADER_SIZE {
            return Err(CcidError::EnvelopeMalformed(format!(
                "{} bytes is shorter than the {HEADER_SIZE}-byte header",
                payload.len()
            )));
        }

        let message_type = payload[0];
        if !ACCEPTED_RESPONSE_TYPES.contains(&message_type) {
            return Err(CcidError::EnvelopeMalformed(format!(
                "unexpected message type 0x{message_type:02x}"
            )));
        }

        let status = payload[7];
        let error = payload[8];
        if status & COMMAND_STATUS_MASK != 0 || error != 0 {
            return Err(CcidError::DeviceStatus { status, error });
        }

        let declared = u32::from_le_bytes([payload[1], payload[2], payload[3], payload[4]]);
        let available = payload.len() - HEADER_SIZE;
        let len = usize::try_from(declared)
            .ok()
            .filter(|len| *len <= available)
            .ok_or_else(|| {
                CcidError::EnvelopeMalformed(format!(
                    "declared length {declared} exceeds {available} received bytes"
                ))
            })?;

        Ok(Self {
            message_type,
            slot: payload[5],
            sequence: payload[6],
            status,
            error,
            data: payload.slice(HEADER_SIZE..HEADER_SIZE + len),
        })
    }
}

struct Header {
    message_type: u8,
    slot: u8,
    sequence: u8,
}

fn split_header(mut payload: &[u8]) -> Result<(Header, &[u8])> {
    if payload.len() < HEADER_SIZE {
        return Err(CcidError::EnvelopeMalformed(format!(
            "{} bytes is shorter than the {HEADER_SIZE}-byte header",
            payload.len()
        )));
    }
    let message_type = payload.get_u8();
    let declared = payload.get_u32_le() as usize;
    let slot = payload.get_u8();
    let sequence = payload.get_u8();
    payload.advance(3);
    if declared > payload.len() {
        return Err(CcidError::EnvelopeMalformed(format!(
            "declared length {declared} exceeds {} received bytes",
            payload.len()
        )));
    }
    Ok((
        Header {
            message_type,
            slot,
            sequence,
        },
        &payload[..declared],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_bytes(
        message_type: u8,
        declared: u32,
        status: u8,
        error: u8,
        data: &[u8],
    ) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_u8(message_type);
        buf.put_u32_le(declared);
        buf.put_slice(&[0x00, 0x01, status, error, 0x00]);
        buf.put_slice(data);
        buf.freeze()
    }

    #[test]
    fn encode_escape_command_layout() {
        let mut buf = BytesMut::new();
        EscapeCommand::new(DEFAULT_SEQUENCE, vec![0xFF, 0x56, 0x00, 0x00, 0x00]).encode(&mut buf);

        assert_eq!(
            buf.as_ref(),
            &[
                0x6B, 0x05, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0xFF, 0x56, 0x00,
                0x00, 0x00
            ]
        );
    }

    #[test]
    fn length_is_little_endian() {
        let mut buf = BytesMut::new();
        EscapeCommand::new(7, vec![0xAB; 0x0123]).encode(&mut buf);
        assert_eq!(&buf[1..5], &[0x23, 0x01, 0x00, 0x00]);
        assert_eq!(buf[6], 7);
    }

    #[test]
    fn command_decode_roundtrip() {
        let cmd = EscapeCommand::new(3, vec![1, 2, 3]);
        let mut buf = BytesMut::new();
        cmd.encode(&mut buf);

        assert_eq!(EscapeCommand::decode(&buf).unwrap(), cmd);
        assert_eq!(cmd.wire_size(), buf.len());
    }

    #[test]
    fn decode_escape_response() {
        let resp =
            EscapeResponse::decode(response_bytes(0x83, 2, 0x00, 0x00, &[0x90, 0x00])).unwrap();
        assert_eq!(resp.message_type, RDR_TO_PC_ESCAPE);
        assert_eq!(resp.sequence, 1);
        assert_eq!(resp.data.as_ref(), &[0x90, 0x00]);
    }

    #[test]
    fn accepts_data_block_and_slot_status() {
        for ty in [RDR_TO_PC_DATA_BLOCK, RDR_TO_PC_SLOT_STATUS] {
            let resp = EscapeResponse::decode(response_bytes(ty, 0, 0, 0, &[])).unwrap();
            assert_eq!(resp.message_type, ty);
            assert!(resp.data.is_empty());
        }
    }

    #[test]
    fn rejects_short_envelope() {
        let short = Bytes::from_static(&[0x83, 0, 0, 0, 0, 0, 1, 0, 0]);
        let err = EscapeResponse::decode(short).unwrap_err();
        assert!(matches!(err, CcidError::EnvelopeMalformed(_)));
    }

    #[test]
    fn rejects_unknown_message_type() {
        let err = EscapeResponse::decode(response_bytes(0x6B, 0, 0, 0, &[])).unwrap_err();
        assert!(matches!(err, CcidError::EnvelopeMalformed(msg) if msg.contains("0x6b")));
    }

    #[test]
    fn rejects_failed_command_status() {
        let err = EscapeResponse::decode(response_bytes(0x83, 0, 0x40, 0x00, &[])).unwrap_err();
        assert!(matches!(err, CcidError::DeviceStatus { status: 0x40, error: 0 }));

        let err = EscapeResponse::decode(response_bytes(0x83, 0, 0x00, 0xFE, &[])).unwrap_err();
        assert!(matches!(err, CcidError::DeviceStatus { status: 0, error: 0xFE }));
    }

    #[test]
    fn icc_presence_bits_are_not_errors() {
        let resp = EscapeResponse::decode(response_bytes(0x83, 1, 0x02, 0x00, &[0x42])).unwrap();
        assert_eq!(resp.status, 0x02);
        assert_eq!(resp.data.as_ref(), &[0x42]);
    }

    #[test]
    fn rejects_declared_length_past_end() {
        let err = EscapeResponse::decode(response_bytes(0x83, 5, 0, 0, &[0x90, 0x00])).unwrap_err();
        assert!(
            matches!(err, CcidError::EnvelopeMalformed(msg) if msg.contains("declared length 5"))
        );
    }

    #[test]
    fn huge_declared_length_is_rejected_not_wrapped() {
        let huge = response_bytes(0x83, u32::MAX, 0, 0, &[0x90, 0x00]);
        let err = EscapeResponse::decode(huge).unwrap_err();
        assert!(matches!(err, CcidError::EnvelopeMalformed(_)));
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let resp = EscapeResponse::decode(response_bytes(0x83, 1, 0, 0, &[0xAA, 0xBB])).unwrap();
        assert_eq!(resp.data.as_ref(), &[0xAA]);
    }

    #[test]
    fn response_encode_decode_roundtrip() {
        let resp = EscapeResponse::ok(DEFAULT_SEQUENCE, vec![0x01, 0x02, 0x90, 0x00]);
        let mut buf = BytesMut::new();
        resp.encode(&mut buf);
        assert_eq!(EscapeResponse::decode(buf.freeze()).unwrap(), resp);
    }

    #[test]
    fn command_decode_rejects_other_types() {
        let err = EscapeCommand::decode(&response_bytes(0x83, 0, 0, 0, &[])).unwrap_err();
        assert!(matches!(err, CcidError::EnvelopeMalformed(_)));
    }
}
