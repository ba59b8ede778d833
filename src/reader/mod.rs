//! reader - чтение cdb-файлов.
//!
//! Разделение по подмодулям:
//! - buf.rs  - путь чтения: index в памяти, буфер read-ahead, позиционные чтения
//! - core.rs - FileReader: открытие/закрытие, привязка CdbConfig
//! - find.rs - поиск по хэш-таблицам (find/get/exists)
//! - iter.rs - последовательный обход записей (firstkey/nextkey, Keys, Records)
//! - mem.rs  - MemReader: in-memory реализация того же контракта для тестов

mod buf;
pub mod core;
mod find;
pub mod iter;
pub mod mem;

use std::path::Path;

use crate::error::Result;

pub use self::core::FileReader;
pub use self::iter::{Keys, Records};
pub use self::mem::MemReader;

/// Read side of a constant database.
///
/// `Ok(None)` / `Ok(false)` mean "absent"; errors are reserved for I/O
/// failures and corrupt files.
pub trait Reader {
    /// Value of the first-written record with this key.
    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn exists(&mut self, key: &[u8]) -> Result<bool>;

    /// Reset the key cursor and return the first key.
    fn firstkey(&mut self) -> Result<Option<Vec<u8>>>;

    /// Next key in insertion order, or `None` once exhausted.
    fn nextkey(&mut self) -> Result<Option<Vec<u8>>>;

    /// Release the underlying handle. Safe to call more than once.
    fn close(&mut self);
}

/// Open a cdb file with the default backend.
pub fn open_reader<P: AsRef<Path>>(path: P) -> Result<Box<dyn Reader>> {
    Ok(Box::new(FileReader::open(path)?))
}
