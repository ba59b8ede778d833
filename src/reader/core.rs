//! reader/core - FileReader: открытие файла, main index, закрытие.
//!
//! После открытия reader ничего не пишет и не перечитывает путь: замена файла
//! writer'ом (rename) не влияет на уже открытый хэндл.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::CdbConfig;
use crate::consts::INDEX_SIZE;
use crate::error::{CdbError, Result};

use super::buf::ReadPath;
use super::Reader;

/// Pure-software cdb reader.
pub struct FileReader {
    pub(crate) path: PathBuf,
    /// None после close().
    pub(crate) io: Option<ReadPath>,
    /// Курсор firstkey/nextkey.
    pub(crate) key_iter_pos: u64,
    /// Граница records/hash tables, вычисляется лениво.
    pub(crate) records_end: Option<u64>,
}

impl FileReader {
    /// Open with configuration from the environment.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, CdbConfig::from_env())
    }

    pub fn open_with_config<P: AsRef<Path>>(path: P, cfg: CdbConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| CdbError::open(&path, e))?;
        let io = ReadPath::open(file, cfg.read_ahead).map_err(|e| match e {
            CdbError::Format(msg) => CdbError::Format(format!("{}: {}", path.display(), msg)),
            // открылся, но не читается (например, каталог)
            CdbError::Io(e) => CdbError::open(&path, e),
            other => other,
        })?;
        debug!(
            "cdb reader: opened {} (read_ahead={})",
            path.display(),
            cfg.read_ahead
        );
        Ok(Self {
            path,
            io: Some(io),
            key_iter_pos: INDEX_SIZE as u64,
            records_end: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.io.is_none()
    }

    /// Release the file handle. Later calls fail with `CdbError::Closed`.
    pub fn close(&mut self) {
        if self.io.take().is_some() {
            debug!("cdb reader: closed {}", self.path.display());
        }
    }

    #[inline]
    pub(crate) fn io(&mut self) -> Result<&mut ReadPath> {
        self.io.as_mut().ok_or(CdbError::Closed)
    }
}

impl Reader for FileReader {
    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        FileReader::get(self, key)
    }

    fn exists(&mut self, key: &[u8]) -> Result<bool> {
        FileReader::exists(self, key)
    }

    fn firstkey(&mut self) -> Result<Option<Vec<u8>>> {
        FileReader::firstkey(self)
    }

    fn nextkey(&mut self) -> Result<Option<Vec<u8>>> {
        FileReader::nextkey(self)
    }

    fn close(&mut self) {
        FileReader::close(self)
    }
}

impl std::fmt::Debug for FileReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileReader")
            .field("path", &self.path)
            .field("closed", &self.is_closed())
            .field("key_iter_pos", &self.key_iter_pos)
            .field("records_end", &self.records_end)
            .finish()
    }
}
