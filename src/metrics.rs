//! Lightweight global metrics for ConstDB.
//!
//! Потокобезопасные атомарные счётчики для подсистем:
//! - Reader lookups (find/probe)
//! - Reader read path (index / buffer / file)
//! - Writer (records, published files)

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

// ----- Lookups -----
static LOOKUPS_TOTAL: AtomicU64 = AtomicU64::new(0);
static LOOKUP_HITS: AtomicU64 = AtomicU64::new(0);
static PROBE_STEPS: AtomicU64 = AtomicU64::new(0);

// ----- Read path -----
static INDEX_READS: AtomicU64 = AtomicU64::new(0);
static BUFFER_HITS: AtomicU64 = AtomicU64::new(0);
static FILE_READS: AtomicU64 = AtomicU64::new(0);
static SEEKS_SKIPPED: AtomicU64 = AtomicU64::new(0);

// ----- Writer -----
static RECORDS_WRITTEN: AtomicU64 = AtomicU64::new(0);
static FILES_PUBLISHED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    // Lookups
    pub lookups_total: u64,
    pub lookup_hits: u64,
    pub probe_steps: u64,

    // Read path
    pub index_reads: u64,
    pub buffer_hits: u64,
    pub file_reads: u64,
    pub seeks_skipped: u64,

    // Writer
    pub records_written: u64,
    pub files_published: u64,
}

impl MetricsSnapshot {
    pub fn hit_ratio(&self) -> f64 {
        if self.lookups_total == 0 {
            0.0
        } else {
            self.lookup_hits as f64 / self.lookups_total as f64
        }
    }

    pub fn avg_probe_steps(&self) -> f64 {
        if self.lookups_total == 0 {
            0.0
        } else {
            self.probe_steps as f64 / self.lookups_total as f64
        }
    }

    /// Share of reads past the index served without touching the file.
    pub fn buffer_hit_ratio(&self) -> f64 {
        let total = self.buffer_hits + self.file_reads;
        if total == 0 {
            0.0
        } else {
            self.buffer_hits as f64 / total as f64
        }
    }
}

// ----- Recorders (lookups) -----
pub fn record_lookup(hit: bool, steps: u64) {
    LOOKUPS_TOTAL.fetch_add(1, Ordering::Relaxed);
    if hit {
        LOOKUP_HITS.fetch_add(1, Ordering::Relaxed);
    }
    PROBE_STEPS.fetch_add(steps, Ordering::Relaxed);
}

// ----- Recorders (read path) -----
pub fn record_index_read() {
    INDEX_READS.fetch_add(1, Ordering::Relaxed);
}
pub fn record_buffer_hit() {
    BUFFER_HITS.fetch_add(1, Ordering::Relaxed);
}
pub fn record_file_read(seek_skipped: bool) {
    FILE_READS.fetch_add(1, Ordering::Relaxed);
    if seek_skipped {
        SEEKS_SKIPPED.fetch_add(1, Ordering::Relaxed);
    }
}

// ----- Recorders (writer) -----
pub fn record_record_written() {
    RECORDS_WRITTEN.fetch_add(1, Ordering::Relaxed);
}
pub fn record_file_published() {
    FILES_PUBLISHED.fetch_add(1, Ordering::Relaxed);
}

// ----- Snapshot / Reset -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        lookups_total: LOOKUPS_TOTAL.load(Ordering::Relaxed),
        lookup_hits: LOOKUP_HITS.load(Ordering::Relaxed),
        probe_steps: PROBE_STEPS.load(Ordering::Relaxed),

        index_reads: INDEX_READS.load(Ordering::Relaxed),
        buffer_hits: BUFFER_HITS.load(Ordering::Relaxed),
        file_reads: FILE_READS.load(Ordering::Relaxed),
        seeks_skipped: SEEKS_SKIPPED.load(Ordering::Relaxed),

        records_written: RECORDS_WRITTEN.load(Ordering::Relaxed),
        files_published: FILES_PUBLISHED.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    LOOKUPS_TOTAL.store(0, Ordering::Relaxed);
    LOOKUP_HITS.store(0, Ordering::Relaxed);
    PROBE_STEPS.store(0, Ordering::Relaxed);

    INDEX_READS.store(0, Ordering::Relaxed);
    BUFFER_HITS.store(0, Ordering::Relaxed);
    FILE_READS.store(0, Ordering::Relaxed);
    SEEKS_SKIPPED.store(0, Ordering::Relaxed);

    RECORDS_WRITTEN.store(0, Ordering::Relaxed);
    FILES_PUBLISHED.store(0, Ordering::Relaxed);
}
