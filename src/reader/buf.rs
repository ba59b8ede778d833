//! reader/buf - путь чтения байтов из cdb-файла.
//!
//! Три уровня:
//! - [0, 2048) отдаётся из main index, загруженного при открытии (без I/O);
//! - запрос, попадающий в буфер read-ahead, отдаётся из буфера;
//! - иначе - позиционное чтение не меньше `read_ahead` байт, буфер заменяется.
//!
//! Последняя позиция файлового хэндла запоминается: последовательные чтения
//! обходятся без seek. Короткое чтение (EOF раньше конца запроса) - FormatError,
//! добивать нулями или обрезать нельзя.

use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};

use crate::codec::{check_int31, decode_pair, read_u32};
use crate::consts::INDEX_SIZE;
use crate::error::{CdbError, Result};
use crate::metrics::{record_buffer_hit, record_file_read, record_index_read};

pub(crate) struct ReadPath {
    file: File,
    index: Vec<u8>,
    buf: Vec<u8>,
    buf_start: u64,
    file_pos: u64,
    read_ahead: usize,
}

/// Read until `out` is full or EOF; returns bytes read.
fn read_full<R: Read>(r: &mut R, out: &mut [u8]) -> std::io::Result<usize> {
    let mut got = 0;
    while got < out.len() {
        match r.read(&mut out[got..]) {
            Ok(0) => break,
            Ok(n) => got += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(got)
}

impl ReadPath {
    /// Load the main index from the start of `file`.
    pub(crate) fn open(mut file: File, read_ahead: usize) -> Result<Self> {
        let mut index = vec![0u8; INDEX_SIZE];
        let got = read_full(&mut file, &mut index)?;
        if got != INDEX_SIZE {
            return Err(CdbError::format(format!(
                "file contains fewer than {INDEX_SIZE} bytes of data ({got})"
            )));
        }
        Ok(Self {
            file,
            index,
            buf: Vec::new(),
            buf_start: 0,
            file_pos: INDEX_SIZE as u64,
            read_ahead,
        })
    }

    /// Fill `out` with the bytes at `[start, start + out.len())`.
    pub(crate) fn read_into(&mut self, start: u64, out: &mut [u8]) -> Result<()> {
        let len = out.len() as u64;
        let end = start
            .checked_add(len)
            .ok_or_else(|| CdbError::format("read range overflows"))?;

        if end <= INDEX_SIZE as u64 {
            let s = start as usize;
            out.copy_from_slice(&self.index[s..s + out.len()]);
            record_index_read();
            return Ok(());
        }

        // Сначала - что есть в буфере.
        let mut done = 0usize;
        let buf_end = self.buf_start + self.buf.len() as u64;
        if !self.buf.is_empty() && start >= self.buf_start && start < buf_end {
            let off = (start - self.buf_start) as usize;
            let n = (self.buf.len() - off).min(out.len());
            out[..n].copy_from_slice(&self.buf[off..off + n]);
            done = n;
            if done == out.len() {
                record_buffer_hit();
                return Ok(());
            }
        }

        let at = start + done as u64;
        let need = out.len() - done;

        let seek_skipped = at == self.file_pos;
        if !seek_skipped {
            self.file.seek(SeekFrom::Start(at)).map_err(|e| {
                CdbError::format(format!("seek to {at} failed, file may be corrupted: {e}"))
            })?;
        }

        let mut fresh = vec![0u8; need.max(self.read_ahead)];
        let got = read_full(&mut self.file, &mut fresh)?;
        record_file_read(seek_skipped);
        self.file_pos = at + got as u64;
        if got < need {
            // хэндл уже сдвинулся, буфер не трогаем
            return Err(CdbError::format(format!(
                "short read at {at}: wanted {need} bytes, got {got}; file may be corrupted"
            )));
        }

        out[done..].copy_from_slice(&fresh[..need]);
        fresh.truncate(got);
        self.buf = fresh;
        self.buf_start = at;
        Ok(())
    }

    pub(crate) fn read(&mut self, start: u64, len: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; len];
        self.read_into(start, &mut out)?;
        Ok(out)
    }

    /// Two consecutive u32 at `pos`, unchecked.
    pub(crate) fn read_pair(&mut self, pos: u64) -> Result<(u32, u32)> {
        let mut b = [0u8; 8];
        self.read_into(pos, &mut b)?;
        Ok(decode_pair(&b))
    }

    /// Main-index entry at byte offset `off` as (table_pos, table_slots), both 31-bit checked.
    pub(crate) fn index_entry(&self, off: usize) -> Result<(u32, u32)> {
        let pos = check_int31(read_u32(&self.index, off))?;
        let slots = check_int31(read_u32(&self.index, off + 4))?;
        Ok((pos, slots))
    }
}
