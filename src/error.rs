//! Error type for the cdb engine.
//!
//! A missing key is not an error: lookups return `Ok(None)` / `Ok(false)`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CdbError>;

#[derive(Debug, Error)]
pub enum CdbError {
    /// Input file missing/unreadable, or the writer's temp file cannot be created.
    #[error("unable to open cdb file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Corrupt or foreign file, or a value that does not fit the format.
    #[error("cdb format error: {0}")]
    Format(String),

    /// Seek/read/write/rename failure.
    #[error("cdb io error: {0}")]
    Io(#[from] io::Error),

    /// The reader or writer has already been closed.
    #[error("cdb handle is closed")]
    Closed,
}

impl CdbError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        CdbError::Format(msg.into())
    }

    pub(crate) fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CdbError::Open {
            path: path.into(),
            source,
        }
    }

    pub fn is_format(&self) -> bool {
        matches!(self, CdbError::Format(_))
    }

    pub fn is_open(&self) -> bool {
        matches!(self, CdbError::Open { .. })
    }

    pub fn is_io(&self) -> bool {
        matches!(self, CdbError::Io(_))
    }
}
