//! Centralized configuration and builder for ConstDB readers and writers.
//!
//! Goals:
//! - Single place to collect tunables instead of scattering env lookups.
//! - CdbConfig::from_env() reads CDB_* variables; open()/create() use it.
//! - CdbBuilder produces a CdbConfig for the *_with_config constructors.
//!
//! Defaults:
//! - read_ahead = 1024 (minimum positioned read when the reader buffer refills)
//! - fsync = true (sync temp file and directory around the publishing rename)

use std::fmt;

use crate::consts::{DEFAULT_READ_AHEAD, MIN_READ_AHEAD};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CdbConfig {
    /// Minimum bytes fetched by one positioned read in the reader.
    /// Env: CDB_READ_AHEAD (default 1024, clamped to >= 8)
    pub read_ahead: usize,

    /// Whether the writer fsyncs the temp file before rename and the
    /// directory after it.
    /// Env: CDB_FSYNC (default true; "0|false|off|no" => false)
    pub fsync: bool,
}

impl Default for CdbConfig {
    fn default() -> Self {
        Self {
            read_ahead: DEFAULT_READ_AHEAD,
            fsync: true,
        }
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl CdbConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("CDB_READ_AHEAD") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.read_ahead = n.max(MIN_READ_AHEAD);
            }
        }

        if let Ok(v) = std::env::var("CDB_FSYNC") {
            if let Some(on) = parse_flag(&v) {
                cfg.fsync = on;
            }
        }

        cfg
    }

    pub fn with_read_ahead(mut self, bytes: usize) -> Self {
        self.read_ahead = bytes.max(MIN_READ_AHEAD);
        self
    }

    pub fn with_fsync(mut self, on: bool) -> Self {
        self.fsync = on;
        self
    }
}

impl fmt::Display for CdbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CdbConfig {{ read_ahead: {}, fsync: {} }}",
            self.read_ahead, self.fsync
        )
    }
}

/// Lightweight builder that produces a CdbConfig.
#[derive(Clone, Debug)]
pub struct CdbBuilder {
    cfg: CdbConfig,
}

impl Default for CdbBuilder {
    fn default() -> Self {
        // Start from env, then allow overrides.
        Self {
            cfg: CdbConfig::from_env(),
        }
    }
}

impl CdbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a clean default (without reading env).
    pub fn from_default() -> Self {
        Self {
            cfg: CdbConfig::default(),
        }
    }

    pub fn read_ahead(mut self, bytes: usize) -> Self {
        self.cfg = self.cfg.with_read_ahead(bytes);
        self
    }

    pub fn fsync(mut self, on: bool) -> Self {
        self.cfg.fsync = on;
        self
    }

    pub fn build(self) -> CdbConfig {
        self.cfg
    }
}
