//! Small helpers: unsigned 32-bit arithmetic over signed wide integers and
//! text helpers for printing keys/values.
//!
//! Hash values travel as `u32` everywhere inside the crate. The `unsigned_*`
//! helpers exist for callers that carry a hash in a signed 64-bit slot (FFI,
//! scripting bindings, values decoded from other tools) where bit 31 may show
//! up as a sign-extended negative number.

use std::fmt::Write as _;

const LOW32: i64 = 0xffff_ffff;

/// Logical right shift of the low 32 bits of `a`.
#[inline]
pub fn unsigned_shift_right(a: i64, b: u32) -> i64 {
    let low = (a & LOW32) as u32;
    if b >= 32 {
        return 0;
    }
    i64::from(low >> b)
}

/// `a mod b`, treating the low 32 bits of `a` as unsigned.
///
/// `b` is expected in `1..0x4000_0000` (cdb slot counts always are).
/// A non-positive `b` yields 0 instead of dividing by zero.
#[inline]
pub fn unsigned_mod(a: i64, b: i64) -> i64 {
    if b <= 0 {
        return 0;
    }
    debug_assert!(b < 0x4000_0000, "modulus out of range: {b}");
    let low = a & LOW32;
    if low & 0x8000_0000 != 0 {
        // 2^31 mod b, собранный из двух половин, чтобы не выйти за 31 бит
        let m = (low & 0x7fff_ffff) % b + 2 * (0x4000_0000 % b);
        m % b
    } else {
        low % b
    }
}

pub fn display_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => format!("(binary {} B)", bytes.len()),
    }
}

pub fn to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{:02x}", b);
    }
    s
}

pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            if i % 16 == 0 {
                out.push('\n');
            } else {
                out.push(' ');
            }
        }
        let _ = write!(out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_matches_native_u32() {
        for &v in &[0u32, 1, 0x7fff_ffff, 0x8000_0000, 0xdead_beef, u32::MAX] {
            // sign-extended form, как его видит знаковый 64-битный хост
            let signed = v as i32 as i64;
            for b in [0u32, 1, 8, 31] {
                assert_eq!(unsigned_shift_right(signed, b), i64::from(v >> b), "v={v:#x} b={b}");
                assert_eq!(unsigned_shift_right(i64::from(v), b), i64::from(v >> b));
            }
        }
    }

    #[test]
    fn mod_matches_native_u32() {
        for &v in &[0u32, 5, 0x7fff_ffff, 0x8000_0000, 0x8000_0001, 0xdead_beef, u32::MAX] {
            let signed = v as i32 as i64;
            for b in [1i64, 2, 3, 6, 1000, 0x3fff_ffff] {
                let want = i64::from(v % b as u32);
                assert_eq!(unsigned_mod(signed, b), want, "v={v:#x} b={b}");
                assert_eq!(unsigned_mod(i64::from(v), b), want);
            }
        }
    }

    #[test]
    fn mod_by_non_positive_is_zero() {
        assert_eq!(unsigned_mod(12345, 0), 0);
        assert_eq!(unsigned_mod(-1, -7), 0);
    }

    #[test]
    fn text_helpers() {
        assert_eq!(display_text(b"abc"), "abc");
        assert_eq!(display_text(&[0xff, 0xfe]), "(binary 2 B)");
        assert_eq!(to_hex(&[0x00, 0xab]), "00ab");
        let dump = hex_dump(&[0u8; 17]);
        assert_eq!(dump.lines().count(), 2);
    }
}
