//! writer - построение cdb-файлов.
//!
//! - core.rs  - FileWriter: временный файл, запись записей, close/Drop, rename
//! - table.rs - раскладка (hash, pos) по 256 хэш-таблицам

pub mod core;
mod table;

use std::path::Path;

use crate::error::Result;

pub use self::core::FileWriter;

/// Write side of a constant database.
pub trait Writer {
    /// Append a key/value record.
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Finish the file and install it at its destination. Calling it again
    /// after success does nothing.
    fn close(&mut self) -> Result<()>;
}

/// Create a writer with the default backend.
pub fn open_writer<P: AsRef<Path>>(path: P) -> Result<Box<dyn Writer>> {
    Ok(Box::new(FileWriter::create(path)?))
}
