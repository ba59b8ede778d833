//! Stable hashing for cdb keys.
//!
//! The format fixes the hash: DJB's `h = ((h << 5) + h) ^ c`, starting at
//! 5381, with every step wrapped to 32 bits. Bucket and slot mapping derive
//! from it:
//! - bucket = low 8 bits (one of 256 sub-tables);
//! - start slot = (hash >> 8) mod slot_count.

use crate::consts::{BUCKETS, HASH_INIT, INDEX_SIZE};

/// Compute the cdb hash of a key.
#[inline]
pub fn cdb_hash(key: &[u8]) -> u32 {
    key.iter().fold(HASH_INIT, |h, &b| {
        h.wrapping_shl(5).wrapping_add(h) ^ u32::from(b)
    })
}

/// Bucket (sub-table number) for a hash value.
#[inline]
pub fn bucket_index(hash: u32) -> usize {
    (hash as usize) % BUCKETS
}

/// Byte offset of the bucket's (pos, slots) pair inside the main index.
/// Same as `bucket_index(hash) * 8`.
#[inline]
pub fn index_offset(hash: u32) -> usize {
    ((hash as usize) << 3) & (INDEX_SIZE - 1)
}

/// First slot to probe in a sub-table with `slots` entries.
#[inline]
pub fn start_slot(hash: u32, slots: u32) -> u32 {
    debug_assert!(slots > 0, "slots must be > 0");
    (hash >> 8) % slots
}
