//! Общие константы формата cdb (index, records, hash tables).

// -------- Main index --------
/// Size of the main index at offset 0: 256 × (pos u32, slots u32).
pub const INDEX_SIZE: usize = 2048;
/// Number of hash sub-tables (buckets), selected by the low 8 bits of the hash.
pub const BUCKETS: usize = 256;
/// Size of one main-index entry.
pub const INDEX_ENTRY_SIZE: usize = 8;

// -------- Records --------
// Формат записи:
// [key_len u32][value_len u32][key bytes][value bytes]
pub const RECORD_HDR_SIZE: usize = 8;

// -------- Hash tables --------
// Слот: [hash u32][record_pos u32]; record_pos == 0 - пустой слот.
pub const SLOT_SIZE: usize = 8;
pub const EMPTY_SLOT_POS: u32 = 0;

// -------- Limits --------
/// Largest value accepted for a length or an offset (31 bits).
pub const MAX_INT31: u32 = 0x7fff_ffff;
/// Offsets are 32-bit, so the whole file must stay below 4 GiB.
pub const MAX_FILE_SIZE: u64 = u32::MAX as u64;

// -------- Hash --------
pub const HASH_INIT: u32 = 5381;

// -------- Reader buffer --------
/// Minimum positioned-read size when the read-ahead buffer is refilled.
pub const DEFAULT_READ_AHEAD: usize = 1024;
pub const MIN_READ_AHEAD: usize = 8;

// -------- Writer --------
/// Temp files live next to the destination: <dest>.tmp.<n>
pub const TMP_INFIX: &str = ".tmp.";
