//! reader/iter - последовательный обход региона записей [2048, records_end).
//!
//! records_end - минимальная позиция непустой хэш-таблицы в main index:
//! все таблицы пишутся после всех записей. Вычисляется один раз.
//!
//! firstkey/nextkey используют курсор reader'а; Keys/Records - собственный,
//! так что итераторы не сбивают firstkey/nextkey.

use crate::codec::decode_record_header;
use crate::consts::{INDEX_ENTRY_SIZE, INDEX_SIZE, RECORD_HDR_SIZE};
use crate::error::{CdbError, Result};

use super::buf::ReadPath;
use super::core::FileReader;

struct RawRecord {
    key: Vec<u8>,
    value: Option<Vec<u8>>,
    next: u64,
}

fn compute_records_end(io: &ReadPath) -> Result<u64> {
    let mut end: Option<u32> = None;
    for off in (0..INDEX_SIZE).step_by(INDEX_ENTRY_SIZE) {
        let (pos, slots) = io.index_entry(off)?;
        if slots > 0 {
            end = Some(end.map_or(pos, |e| e.min(pos)));
        }
    }
    let end = end.map_or(INDEX_SIZE as u64, u64::from);
    if end < INDEX_SIZE as u64 {
        return Err(CdbError::format(format!(
            "hash table position {end} points into the main index"
        )));
    }
    Ok(end)
}

/// Record at `pos`, or None at the end of the records region.
fn read_record(io: &mut ReadPath, pos: u64, end: u64, with_value: bool) -> Result<Option<RawRecord>> {
    if pos >= end {
        return Ok(None);
    }
    let mut hdr = [0u8; RECORD_HDR_SIZE];
    io.read_into(pos, &mut hdr)?;
    let (key_len, value_len) = decode_record_header(&hdr)?;

    let key_at = pos + RECORD_HDR_SIZE as u64;
    let value_at = key_at + u64::from(key_len);
    let next = value_at + u64::from(value_len);
    if next > end {
        return Err(CdbError::format(format!(
            "record at {pos} runs past the records region end {end}"
        )));
    }

    let key = io.read(key_at, key_len as usize)?;
    let value = if with_value {
        Some(io.read(value_at, value_len as usize)?)
    } else {
        None
    };
    Ok(Some(RawRecord { key, value, next }))
}

impl FileReader {
    /// Offset where the hash tables start (end of the records region).
    pub fn records_end(&mut self) -> Result<u64> {
        if let Some(end) = self.records_end {
            return Ok(end);
        }
        let end = compute_records_end(self.io()?)?;
        self.records_end = Some(end);
        Ok(end)
    }

    /// Reset the cursor and return the first key.
    pub fn firstkey(&mut self) -> Result<Option<Vec<u8>>> {
        self.key_iter_pos = INDEX_SIZE as u64;
        self.nextkey()
    }

    /// Key at the cursor; advances past the record.
    pub fn nextkey(&mut self) -> Result<Option<Vec<u8>>> {
        let end = self.records_end()?;
        let pos = self.key_iter_pos;
        match read_record(self.io()?, pos, end, false)? {
            Some(rec) => {
                self.key_iter_pos = rec.next;
                Ok(Some(rec.key))
            }
            None => Ok(None),
        }
    }

    /// Iterate over all keys in insertion order (duplicates included).
    pub fn keys(&mut self) -> Result<Keys<'_>> {
        let end = self.records_end()?;
        Ok(Keys {
            inner: Cursor::new(self, end),
        })
    }

    /// Iterate over all (key, value) records in insertion order.
    pub fn records(&mut self) -> Result<Records<'_>> {
        let end = self.records_end()?;
        Ok(Records {
            inner: Cursor::new(self, end),
        })
    }
}

struct Cursor<'a> {
    reader: &'a mut FileReader,
    pos: u64,
    end: u64,
    done: bool,
}

impl<'a> Cursor<'a> {
    fn new(reader: &'a mut FileReader, end: u64) -> Self {
        Self {
            reader,
            pos: INDEX_SIZE as u64,
            end,
            done: false,
        }
    }

    fn advance(&mut self, with_value: bool) -> Option<Result<RawRecord>> {
        if self.done {
            return None;
        }
        let (pos, end) = (self.pos, self.end);
        let res = self
            .reader
            .io()
            .and_then(|io| read_record(io, pos, end, with_value));
        match res {
            Ok(Some(rec)) => {
                self.pos = rec.next;
                Some(Ok(rec))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                // после ошибки итерация останавливается
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Iterator over keys; see [`FileReader::keys`].
pub struct Keys<'a> {
    inner: Cursor<'a>,
}

impl Iterator for Keys<'_> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.advance(false).map(|r| r.map(|rec| rec.key))
    }
}

/// Iterator over (key, value) pairs; see [`FileReader::records`].
pub struct Records<'a> {
    inner: Cursor<'a>,
}

impl Iterator for Records<'_> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .advance(true)
            .map(|r| r.map(|rec| (rec.key, rec.value.unwrap_or_default())))
    }
}
