//! writer/core - FileWriter: запись записей во временный файл и публикация.
//!
//! Протокол:
//! - create(): временный файл <dest>.tmp.<n> рядом с целевым (create_new),
//!   курсор сразу на 2048 - место под main index остаётся пустым;
//! - set(): запись [klen][vlen][key][value] по текущей позиции,
//!   (hash, pos) запоминается в bucket'е hash & 255;
//! - close(): 256 хэш-таблиц после записей, main index в начало файла,
//!   flush (+fsync), rename поверх целевого файла;
//! - Drop без close() выполняет close(); ошибка в Drop только логируется.
//!
//! Если что-то сломалось, временный файл удаляется, целевой не трогается,
//! а ошибка возвращается вызывающему.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rand::Rng;

use crate::codec::{encode_pair, encode_record_header, to_int31};
use crate::config::CdbConfig;
use crate::consts::{
    BUCKETS, INDEX_SIZE, MAX_FILE_SIZE, MAX_INT31, RECORD_HDR_SIZE, SLOT_SIZE, TMP_INFIX,
};
use crate::error::{CdbError, Result};
use crate::hash::cdb_hash;
use crate::metrics::{record_file_published, record_record_written};

use super::table::{build_table, encode_table, Buckets};
use super::Writer;

const TMP_CREATE_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Closed,
    Failed,
}

/// Pure-software cdb writer.
pub struct FileWriter {
    real_path: PathBuf,
    tmp_path: PathBuf,
    out: Option<BufWriter<File>>,
    /// Абсолютная позиция следующей записи.
    pos: u64,
    buckets: Buckets,
    count: usize,
    cfg: CdbConfig,
    state: State,
}

fn tmp_path_for(real: &Path) -> PathBuf {
    let n: u32 = rand::thread_rng().gen_range(0..=MAX_INT31);
    let mut s = real.as_os_str().to_os_string();
    s.push(format!("{TMP_INFIX}{n}"));
    PathBuf::from(s)
}

#[cfg(unix)]
fn fsync_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            let dir = File::open(parent)?;
            dir.sync_all()?;
        }
    }
    Ok(())
}
#[cfg(not(unix))]
fn fsync_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Atomically replace `real` with `tmp`.
fn publish(tmp: &Path, real: &Path) -> io::Result<()> {
    // Windows не умеет rename поверх существующего файла.
    #[cfg(windows)]
    {
        match fs::remove_file(real) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    fs::rename(tmp, real)
}

impl FileWriter {
    /// Create a writer for `path` with configuration from the environment.
    /// The directory of `path` must be writable (temp file lives there).
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::create_with_config(path, CdbConfig::from_env())
    }

    pub fn create_with_config<P: AsRef<Path>>(path: P, cfg: CdbConfig) -> Result<Self> {
        let real_path = path.as_ref().to_path_buf();

        let mut attempt = 0;
        let (file, tmp_path) = loop {
            let tmp = tmp_path_for(&real_path);
            match OpenOptions::new().write(true).create_new(true).open(&tmp) {
                Ok(f) => break (f, tmp),
                Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt + 1 < TMP_CREATE_ATTEMPTS => {
                    attempt += 1;
                }
                Err(e) => return Err(CdbError::open(tmp, e)),
            }
        };

        let mut out = BufWriter::new(file);
        if let Err(e) = out.seek(SeekFrom::Start(INDEX_SIZE as u64)) {
            drop(out);
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        debug!(
            "cdb writer: {} -> temp {} ({})",
            real_path.display(),
            tmp_path.display(),
            cfg
        );

        Ok(Self {
            real_path,
            tmp_path,
            out: Some(out),
            pos: INDEX_SIZE as u64,
            buckets: Buckets::new(),
            count: 0,
            cfg,
            state: State::Open,
        })
    }

    pub fn path(&self) -> &Path {
        &self.real_path
    }

    /// Records written so far.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_closed(&self) -> bool {
        self.state != State::Open
    }

    /// Append a record. Duplicate keys are kept; readers see the first one.
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if self.state != State::Open {
            return Err(CdbError::Closed);
        }

        // Все проверки - до первого записанного байта.
        let hdr = encode_record_header(key.len(), value.len())?;
        let rec_pos = to_int31(self.pos, "record position")?;
        let next = self.pos + (RECORD_HDR_SIZE + key.len() + value.len()) as u64;
        to_int31(next, "records region end")?;
        // каждая запись добавляет два слота в хэш-таблицы
        let final_size = next + (self.count as u64 + 1) * 2 * SLOT_SIZE as u64;
        if final_size > MAX_FILE_SIZE {
            return Err(CdbError::format(format!(
                "file would grow to {final_size} bytes, past the 4 GiB limit"
            )));
        }

        let out = self.out.as_mut().ok_or(CdbError::Closed)?;
        let res = out
            .write_all(&hdr)
            .and_then(|_| out.write_all(key))
            .and_then(|_| out.write_all(value));
        if let Err(e) = res {
            // поток в неизвестном состоянии - публиковать нельзя
            self.state = State::Failed;
            return Err(e.into());
        }

        self.buckets.push(cdb_hash(key), rec_pos);
        self.pos = next;
        self.count += 1;
        record_record_written();
        Ok(())
    }

    /// Write hash tables and index, then install the file. Idempotent after
    /// success.
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            State::Closed => Ok(()),
            State::Failed => {
                self.discard();
                Err(CdbError::Io(io::Error::new(
                    ErrorKind::Other,
                    format!(
                        "writer for {} failed earlier; destination not updated",
                        self.real_path.display()
                    ),
                )))
            }
            State::Open => match self.finish() {
                Ok(size) => {
                    self.state = State::Closed;
                    record_file_published();
                    info!(
                        "cdb writer: published {} ({} record(s), {} B)",
                        self.real_path.display(),
                        self.count,
                        size
                    );
                    Ok(())
                }
                Err(e) => {
                    self.state = State::Failed;
                    self.discard();
                    Err(e)
                }
            },
        }
    }

    /// Throw away everything written so far; the destination is not touched.
    pub fn abandon(&mut self) {
        if self.state != State::Closed {
            self.discard();
            self.state = State::Closed;
            debug!("cdb writer: abandoned {}", self.real_path.display());
        }
    }

    fn finish(&mut self) -> Result<u64> {
        let mut out = self.out.take().ok_or(CdbError::Closed)?;

        let mut index = Vec::with_capacity(INDEX_SIZE);
        let mut cursor = self.pos;
        for i in 0..BUCKETS {
            let table = build_table(self.buckets.bucket(i));
            let table_pos = to_int31(cursor, "hash table position")?;
            index.extend_from_slice(&encode_pair(table_pos, table.len() as u32));
            out.write_all(&encode_table(&table))?;
            cursor += (table.len() * SLOT_SIZE) as u64;
        }
        if cursor > MAX_FILE_SIZE {
            return Err(CdbError::format(format!(
                "file size {cursor} exceeds the 4 GiB limit"
            )));
        }

        // seek у BufWriter сначала сбрасывает буфер
        out.seek(SeekFrom::Start(0))?;
        out.write_all(&index)?;
        out.flush()?;
        let file = out.into_inner().map_err(|e| e.into_error())?;
        if self.cfg.fsync {
            file.sync_all()?;
        }
        drop(file);

        publish(&self.tmp_path, &self.real_path)?;

        if self.cfg.fsync {
            if let Err(e) = fsync_dir(&self.real_path) {
                // rename уже состоялся; файл на месте
                warn!(
                    "cdb writer: fsync of directory for {} failed: {e}",
                    self.real_path.display()
                );
            }
        }
        Ok(cursor)
    }

    /// Drop the output and remove the temp file, best effort.
    fn discard(&mut self) {
        self.out = None;
        match fs::remove_file(&self.tmp_path) {
            Ok(()) => debug!("cdb writer: removed temp {}", self.tmp_path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                "cdb writer: failed to remove temp {}: {e}",
                self.tmp_path.display()
            ),
        }
    }
}

impl Writer for FileWriter {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        FileWriter::set(self, key, value)
    }

    fn close(&mut self) -> Result<()> {
        FileWriter::close(self)
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        match self.state {
            State::Open => {
                if let Err(e) = self.close() {
                    warn!(
                        "cdb writer: close on drop failed for {}: {e}",
                        self.real_path.display()
                    );
                }
            }
            State::Failed => self.discard(),
            State::Closed => {}
        }
    }
}

impl std::fmt::Debug for FileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWriter")
            .field("path", &self.real_path)
            .field("tmp_path", &self.tmp_path)
            .field("records", &self.count)
            .field("pos", &self.pos)
            .field("state", &self.state)
            .finish()
    }
}
