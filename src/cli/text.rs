//! cli/text - текстовая форма cdbdump/cdbmake.
//!
//! Одна запись на строку: `+klen,dlen:key->data\n`, в конце пустая строка.
//! key и data - сырые байты, длины в десятичном виде.

use std::io::{BufRead, Write};

use anyhow::{anyhow, bail, Result};

pub fn write_record<W: Write>(out: &mut W, key: &[u8], value: &[u8]) -> Result<()> {
    write!(out, "+{},{}:", key.len(), value.len())?;
    out.write_all(key)?;
    out.write_all(b"->")?;
    out.write_all(value)?;
    out.write_all(b"\n")?;
    Ok(())
}

pub fn write_end<W: Write>(out: &mut W) -> Result<()> {
    out.write_all(b"\n")?;
    Ok(())
}

fn read_byte<R: BufRead>(r: &mut R) -> Result<Option<u8>> {
    let mut b = [0u8; 1];
    let n = r.read(&mut b)?;
    Ok(if n == 0 { None } else { Some(b[0]) })
}

fn expect_byte<R: BufRead>(r: &mut R, want: u8, rec: usize) -> Result<()> {
    match read_byte(r)? {
        Some(b) if b == want => Ok(()),
        Some(b) => bail!(
            "record {rec}: expected {:?}, found {:?}",
            want as char,
            b as char
        ),
        None => bail!("record {rec}: unexpected end of input"),
    }
}

/// Decimal length terminated by `end`.
fn read_len<R: BufRead>(r: &mut R, end: u8, rec: usize) -> Result<usize> {
    let mut n: usize = 0;
    let mut digits = 0;
    loop {
        match read_byte(r)? {
            Some(b) if b == end && digits > 0 => return Ok(n),
            Some(b @ b'0'..=b'9') => {
                n = n
                    .checked_mul(10)
                    .and_then(|n| n.checked_add(usize::from(b - b'0')))
                    .ok_or_else(|| anyhow!("record {rec}: length overflow"))?;
                digits += 1;
            }
            Some(b) => bail!("record {rec}: bad length byte {:?}", b as char),
            None => bail!("record {rec}: unexpected end of input"),
        }
    }
}

fn read_exact_vec<R: BufRead>(r: &mut R, len: usize, rec: usize) -> Result<Vec<u8>> {
    let mut v = vec![0u8; len];
    r.read_exact(&mut v)
        .map_err(|e| anyhow!("record {rec}: truncated data: {e}"))?;
    Ok(v)
}

/// Parse cdbmake input, calling `sink` for every record in order.
/// Returns the number of records.
pub fn read_records<R, F>(r: &mut R, mut sink: F) -> Result<usize>
where
    R: BufRead,
    F: FnMut(&[u8], &[u8]) -> Result<()>,
{
    let mut count = 0;
    loop {
        let rec = count + 1;
        match read_byte(r)? {
            // пустая строка или конец ввода - конец данных
            None | Some(b'\n') => return Ok(count),
            Some(b'+') => {}
            Some(b) => bail!("record {rec}: expected '+', found {:?}", b as char),
        }
        let klen = read_len(r, b',', rec)?;
        let dlen = read_len(r, b':', rec)?;
        let key = read_exact_vec(r, klen, rec)?;
        expect_byte(r, b'-', rec)?;
        expect_byte(r, b'>', rec)?;
        let data = read_exact_vec(r, dlen, rec)?;
        expect_byte(r, b'\n', rec)?;
        sink(&key, &data)?;
        count += 1;
    }
}
