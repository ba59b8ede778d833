#![allow(non_snake_case)]

// Формат и примитивы
pub mod consts;
pub mod hash;
pub mod util;
pub mod codec;
pub mod error;

// Настройки и метрики
pub mod config;
pub mod metrics;

// Движки
pub mod reader; // src/reader/{mod,core,buf,find,iter,mem}.rs
pub mod writer; // src/writer/{mod,core,table}.rs

// Командная строка (get/list/match/dump/make/stats)
pub mod cli;    // src/cli.rs + src/cli/text.rs

// Удобные реэкспорты
pub use config::{CdbBuilder, CdbConfig};
pub use error::{CdbError, Result};
pub use hash::cdb_hash;
pub use reader::{open_reader, FileReader, MemReader, Reader};
pub use writer::{open_writer, FileWriter, Writer};
