//! Length and data checksums.
//!
//! Both checksums are two's-complement sums: adding the checksum byte to the
//! bytes it covers yields zero modulo 256.

/// Length checksum (LCS) for a 16-bit frame length.
///
/// `(high(len) + low(len) + LCS) mod 256 == 0`.
pub fn length_checksum(len: u16) -> u8 {
    let [hi, lo] = len.to_be_bytes();
    hi.wrapping_add(lo).wrapping_neg()
}

/// Data checksum (DCS) over a payload.
///
/// `(sum(payload) + DCS) mod 256 == 0`.
pub fn data_checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |acc, b| acc.wrapping_add(*b))
        .wrapping_neg()
}
