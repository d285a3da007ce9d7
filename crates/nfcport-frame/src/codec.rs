use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::checksum::{data_checksum, length_checksum};
use crate::error::{FrameError, Result};
use crate::sync::PreambleScanner;

/// Preamble byte.
pub const PREAMBLE: u8 = 0x00;

/// Start code following the preamble.
pub const START_CODE: [u8; 2] = [0x00, 0xFF];

/// Postamble byte.
pub const POSTAMBLE: u8 = 0x00;

/// The complete ACK packet.
pub const ACK_FRAME: [u8; 7] = [0x00, 0x00, 0xFF, 0x00, 0x00, 0xFF, 0x00];

/// Bytes a data frame adds around its payload:
/// preamble (1) + start code (2) + length (2) + LCS (1) + DCS (1) + postamble (1).
pub const FRAME_OVERHEAD: usize = 8;

/// Default maximum payload size in bytes.
///
/// Large enough for the 10-byte CCID header plus the longest command or
/// response the driver exchanges.
pub const DEFAULT_MAX_PAYLOAD: usize = 512;

const START_LEN: usize = 3;
const HEADER_LEN: usize = 3;

/// Frame value `LCS` marking an ACK when the length is zero.
const ACK_LCS: u8 = 0xFF;

/// A verified inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Zero-length acknowledgement.
    Ack,
    /// Data frame with its payload (checksums already verified).
    Data(Bytes),
}

impl InboundFrame {
    pub fn is_ack(&self) -> bool {
        matches!(self, InboundFrame::Ack)
    }

    /// Payload bytes; empty for an ACK.
    pub fn payload(&self) -> &[u8] {
        match self {
            InboundFrame::Ack => &[],
            InboundFrame::Data(payload) => payload,
        }
    }

    pub fn into_payload(self) -> Bytes {
        match self {
            InboundFrame::Ack => Bytes::new(),
            InboundFrame::Data(payload) => payload,
        }
    }
}

/// Encode a payload into a host packet.
///
/// Wire format:
/// ```text
/// ┌─────┬───────┬──────────┬─────┬─────────────┬─────┬──────┐
/// │ PRE │ START │ LEN      │ LCS │ Payload     │ DCS │ POST │
/// │ 00  │ 00 FF │ (2B BE)  │     │ (LEN bytes) │     │ 00   │
/// └─────┴───────┴──────────┴─────┴─────────────┴─────┴──────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let len = u16::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: payload.len(),
        max: u16::MAX as usize,
    })?;
    dst.reserve(FRAME_OVERHEAD + payload.len());
    dst.put_u8(PREAMBLE);
    dst.put_slice(&START_CODE);
    dst.put_u16(len);
    dst.put_u8(length_checksum(len));
    dst.put_slice(payload);
    dst.put_u8(data_checksum(payload));
    dst.put_u8(POSTAMBLE);
    Ok(())
}

/// Decode one frame from a buffer.
///
/// Bytes before the frame start are discarded. Returns `Ok(None)` if the
/// buffer does not hold a complete frame yet; the partial frame is kept.
/// On a checksum or size error the start code is consumed so the next call
/// resynchronizes past the bad frame.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<InboundFrame>> {
    let mut scanner = PreambleScanner::new();
    let Some(end) = src.iter().position(|b| scanner.push(*b)) else {
        let keep = scanner.state().matched();
        src.advance(src.len() - keep);
        return Ok(None);
    };
    src.advance(end + 1 - START_LEN);

    if src.len() < START_LEN + HEADER_LEN {
        return Ok(None);
    }
    let len = u16::from_be_bytes([src[3], src[4]]);
    let lcs = src[5];

    if len == 0 && lcs == ACK_LCS {
        if src.len() < START_LEN + HEADER_LEN + 1 {
            return Ok(None);
        }
        src.advance(START_LEN + HEADER_LEN + 1);
        return Ok(Some(InboundFrame::Ack));
    }

    let expected = length_checksum(len);
    if lcs != expected {
        src.advance(START_LEN);
        return Err(FrameError::LengthChecksum { got: lcs, expected });
    }

    let len = len as usize;
    if len > max_payload {
        src.advance(START_LEN);
        return Err(FrameError::PayloadTooLarge {
            size: len,
            max: max_payload,
        });
    }

    if src.len() < START_LEN + HEADER_LEN + len + 2 {
        return Ok(None);
    }

    src.advance(START_LEN + HEADER_LEN);
    let payload = src.split_to(len).freeze();
    let dcs = src.get_u8();
    let _postamble = src.get_u8();

    let expected = data_checksum(&payload);
    if dcs != expected {
        return Err(FrameError::DataChecksum { got: dcs, expected });
    }

    Ok(Some(InboundFrame::Data(payload)))
}

/// Configuration for frame encoding and decoding.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: [`DEFAULT_MAX_PAYLOAD`].
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(payload: &[u8]) -> BytesMut {
        let mut buf = BytesMut::new();
        encode_frame(payload, &mut buf).unwrap();
        buf
    }

    #[test]
    fn encode_exact_layout() {
        let buf = encoded(&[0xD4, 0x02]);
        assert_eq!(
            buf.as_ref(),
            &[0x00, 0x00, 0xFF, 0x00, 0x02, 0xFE, 0xD4, 0x02, 0x2A, 0x00]
        );
    }

    #[test]
    fn encode_decode_roundtrip() {
        let payload = b"\x6b\x05\x00\x00\x00\x00\x01\x00\x00\x00\xff\x56\x00\x00\x00";
        let mut buf = encoded(payload);

        assert_eq!(buf.len(), FRAME_OVERHEAD + payload.len());

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(frame.payload(), payload);
        assert!(!frame.is_ack());
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_ack() {
        let mut buf = BytesMut::from(&ACK_FRAME[..]);
        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        assert!(frame.is_ack());
        assert!(frame.payload().is_empty());
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_skips_garbage() {
        let mut buf = BytesMut::from(&[0x13, 0x37, 0x00, 0xFF][..]);
        buf.extend_from_slice(&encoded(b"abc"));

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(frame.payload(), b"abc");
    }

    #[test]
    fn decode_incomplete_keeps_partial_frame() {
        let full = encoded(b"hello");
        let mut buf = BytesMut::from(&[0x42, 0x42][..]);
        buf.extend_from_slice(&full[..7]);

        assert!(decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().is_none());
        assert_eq!(buf.as_ref(), &full[..7]);

        buf.extend_from_slice(&full[7..]);
        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(frame.payload(), b"hello");
    }

    #[test]
    fn decode_without_start_keeps_possible_prefix() {
        let mut buf = BytesMut::from(&[0x01, 0x02, 0x00, 0x00][..]);
        assert!(decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().is_none());
        assert_eq!(buf.as_ref(), &[0x00, 0x00]);
    }

    #[test]
    fn decode_bad_lcs() {
        let mut buf = encoded(b"abc");
        buf[5] ^= 0x01;
        let err = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap_err();
        assert!(matches!(err, FrameError::LengthChecksum { .. }));
    }

    #[test]
    fn decode_bad_dcs() {
        let mut buf = encoded(b"abc");
        let dcs = buf.len() - 2;
        buf[dcs] ^= 0x80;
        let err = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap_err();
        assert!(matches!(err, FrameError::DataChecksum { .. }));
    }

    #[test]
    fn decode_payload_too_large() {
        let mut buf = encoded(&[0x55; 32]);
        let err = decode_frame(&mut buf, 16).unwrap_err();
        assert!(matches!(
            err,
            FrameError::PayloadTooLarge { size: 32, max: 16 }
        ));
    }

    #[test]
    fn decode_two_frames_back_to_back() {
        let mut buf = BytesMut::from(&ACK_FRAME[..]);
        buf.extend_from_slice(&encoded(b"second"));

        let first = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        let second = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();

        assert_eq!(first, InboundFrame::Ack);
        assert_eq!(second.payload(), b"second");
        assert!(buf.is_empty());
    }

    #[test]
    fn empty_data_frame_is_not_an_ack() {
        let mut buf = encoded(&[]);
        assert_eq!(buf.as_ref(), &[0x00, 0x00, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00]);
        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(frame, InboundFrame::Data(Bytes::new()));
    }
}
