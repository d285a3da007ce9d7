//! BER-TLV walking for Transparent Exchange data objects.
//!
//! Tags are one byte, except when the first byte is `0x5F` or `0xFF`, in
//! which case a second tag byte follows. Lengths are always one byte. A
//! length that runs past the end of the buffer ends the walk.

use bytes::{BufMut, BytesMut};

use crate::error::{DeviceError, Result};

/// First tag bytes that introduce a two-byte tag.
pub const MULTI_BYTE_TAG_MARKERS: [u8; 2] = [0x5F, 0xFF];

/// Largest value a one-byte length can describe.
pub const MAX_VALUE_LEN: usize = u8::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Short(u8),
    Long(u8, u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvEntry<'a> {
    pub tag: Tag,
    pub value: &'a [u8],
}

/// Iterator over the well-formed entries at the start of a buffer.
#[derive(Debug, Clone)]
pub struct TlvEntries<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> TlvEntries<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn stop(&mut self) -> Option<TlvEntry<'a>> {
        self.pos = self.buf.len();
        None
    }
}

impl<'a> Iterator for TlvEntries<'a> {
    type Item = TlvEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let buf = self.buf;
        if self.pos + 2 > buf.len() {
            return self.stop();
        }

        let first = buf[self.pos];
        self.pos += 1;
        let tag = if MULTI_BYTE_TAG_MARKERS.contains(&first) {
            let Some(&second) = buf.get(self.pos) else {
                return self.stop();
            };
            self.pos += 1;
            Tag::Long(first, second)
        } else {
            Tag::Short(first)
        };

        let Some(&len) = buf.get(self.pos) else {
            return self.stop();
        };
        self.pos += 1;

        let end = self.pos + len as usize;
        if end > buf.len() {
            return self.stop();
        }
        let value = &buf[self.pos..end];
        self.pos = end;
        Some(TlvEntry { tag, value })
    }
}

/// Value of the first entry with single-byte tag `tag`.
///
/// Two-byte tags never match. Returns `None` if the tag is absent or the
/// walk hits a truncated entry first.
pub fn find_tag(buf: &[u8], tag: u8) -> Option<&[u8]> {
    TlvEntries::new(buf)
        .find(|entry| entry.tag == Tag::Short(tag))
        .map(|entry| entry.value)
}

/// Append a single-byte-tag entry.
pub fn push_tlv(dst: &mut BytesMut, tag: u8, value: &[u8]) -> Result<()> {
    if value.len() > MAX_VALUE_LEN {
        return Err(DeviceError::DataTooLong {
            len: value.len(),
            max: MAX_VALUE_LEN,
        });
    }
    dst.reserve(2 + value.len());
    dst.put_u8(tag);
    dst.put_u8(value.len() as u8);
    dst.put_slice(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_entry() {
        let buf = [0x97, 0x03, 0xAA, 0xBB, 0xCC];
        assert_eq!(find_tag(&buf, 0x97), Some(&[0xAA, 0xBB, 0xCC][..]));
    }

    #[test]
    fn skips_two_byte_tag() {
        let buf = [0x5F, 0x01, 0x01, 0xAA, 0x97, 0x01, 0xBB];
        assert_eq!(find_tag(&buf, 0x97), Some(&[0xBB][..]));
    }

    #[test]
    fn two_byte_tag_never_matches_its_second_byte() {
        let buf = [0xFF, 0x97, 0x01, 0xAA];
        assert_eq!(find_tag(&buf, 0x97), None);
        assert_eq!(find_tag(&buf, 0xFF), None);
    }

    #[test]
    fn skips_other_single_byte_tags() {
        let buf = [0xC0, 0x03, 0x00, 0x90, 0x00, 0x92, 0x01, 0x00, 0x97, 0x02, 0x12, 0x34];
        assert_eq!(find_tag(&buf, 0x97), Some(&[0x12, 0x34][..]));
        assert_eq!(find_tag(&buf, 0x92), Some(&[0x00][..]));
    }

    #[test]
    fn first_match_wins() {
        let buf = [0x97, 0x01, 0x01, 0x97, 0x01, 0x02];
        assert_eq!(find_tag(&buf, 0x97), Some(&[0x01][..]));
    }

    #[test]
    fn truncated_value_is_not_found() {
        let buf = [0x97, 0x05, 0xAA, 0xBB];
        assert_eq!(find_tag(&buf, 0x97), None);
    }

    #[test]
    fn truncated_length_field_is_not_found() {
        assert_eq!(find_tag(&[0x97], 0x97), None);
        assert_eq!(find_tag(&[0x5F, 0x01], 0x97), None);
        assert_eq!(find_tag(&[0xC0, 0x00, 0x97], 0x97), None);
    }

    #[test]
    fn overrun_in_earlier_entry_ends_scan() {
        let buf = [0xC0, 0x10, 0x97, 0x01, 0xAA];
        assert_eq!(find_tag(&buf, 0x97), None);
    }

    #[test]
    fn empty_value_is_found() {
        assert_eq!(find_tag(&[0x97, 0x00], 0x97), Some(&[][..]));
    }

    #[test]
    fn empty_buffer() {
        assert_eq!(find_tag(&[], 0x97), None);
        assert_eq!(TlvEntries::new(&[]).count(), 0);
    }

    #[test]
    fn iterates_all_entries() {
        let buf = [0x5F, 0x46, 0x01, 0x07, 0x97, 0x00, 0x90, 0x02, 0x00, 0x00];
        let entries: Vec<_> = TlvEntries::new(&buf).collect();
        assert_eq!(
            entries,
            vec![
                TlvEntry {
                    tag: Tag::Long(0x5F, 0x46),
                    value: &[0x07]
                },
                TlvEntry {
                    tag: Tag::Short(0x97),
                    value: &[]
                },
                TlvEntry {
                    tag: Tag::Short(0x90),
                    value: &[0x00, 0x00]
                },
            ]
        );
    }

    #[test]
    fn push_tlv_roundtrip() {
        let mut buf = BytesMut::new();
        push_tlv(&mut buf, 0x95, &[0x06, 0x00, 0xFF, 0xFF, 0x00, 0x00]).unwrap();
        assert_eq!(buf.as_ref(), &[0x95, 0x06, 0x06, 0x00, 0xFF, 0xFF, 0x00, 0x00]);
        assert_eq!(find_tag(&buf, 0x95).map(<[u8]>::len), Some(6));
    }

    #[test]
    fn push_tlv_rejects_long_value() {
        let mut buf = BytesMut::new();
        let err = push_tlv(&mut buf, 0x95, &[0; 256]).unwrap_err();
        assert!(matches!(err, DeviceError::DataTooLong { len: 256, max: 255 }));
        assert!(buf.is_empty());
    }
}
