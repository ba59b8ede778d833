//! Binary codec for the fixed-width parts of a cdb file.
//!
//! Everything on disk is a pair of little-endian u32:
//! - main-index entry: [table_pos u32][table_slots u32]
//! - record header:    [key_len u32][value_len u32]
//! - hash-table slot:  [hash u32][record_pos u32]
//!
//! Lengths and offsets must fit in 31 bits; the hash is a full u32.

use byteorder::{ByteOrder, LittleEndian};

use crate::consts::MAX_INT31;
use crate::error::{CdbError, Result};

/// Read a raw u32 at `off` in `buf`.
#[inline]
pub fn read_u32(buf: &[u8], off: usize) -> u32 {
    LittleEndian::read_u32(&buf[off..off + 4])
}

/// Read a u32 at `off` and require it to fit in 31 bits.
#[inline]
pub fn read_int31(buf: &[u8], off: usize) -> Result<u32> {
    check_int31(read_u32(buf, off))
}

/// Range check for lengths/offsets read from or written to a file.
#[inline]
pub fn check_int31(v: u32) -> Result<u32> {
    if v > MAX_INT31 {
        return Err(CdbError::format(format!(
            "integer too big: {v:#x} exceeds 31 bits"
        )));
    }
    Ok(v)
}

/// Convert an in-memory length/offset into an on-disk 31-bit value.
pub fn to_int31(v: u64, what: &str) -> Result<u32> {
    if v > u64::from(MAX_INT31) {
        return Err(CdbError::format(format!(
            "{what} {v} does not fit in 31 bits"
        )));
    }
    Ok(v as u32)
}

/// Encode any (u32, u32) pair.
#[inline]
pub fn encode_pair(a: u32, b: u32) -> [u8; 8] {
    let mut out = [0u8; 8];
    LittleEndian::write_u32(&mut out[0..4], a);
    LittleEndian::write_u32(&mut out[4..8], b);
    out
}

/// Decode a raw (u32, u32) pair from the first 8 bytes of `buf`.
#[inline]
pub fn decode_pair(buf: &[u8]) -> (u32, u32) {
    (read_u32(buf, 0), read_u32(buf, 4))
}

/// Record header for a key/value of the given lengths.
pub fn encode_record_header(key_len: usize, value_len: usize) -> Result<[u8; 8]> {
    let k = to_int31(key_len as u64, "key length")?;
    let v = to_int31(value_len as u64, "value length")?;
    Ok(encode_pair(k, v))
}

/// Decode and validate a record header: (key_len, value_len).
pub fn decode_record_header(buf: &[u8]) -> Result<(u32, u32)> {
    Ok((read_int31(buf, 0)?, read_int31(buf, 4)?))
}
