//! reader/find - поиск ключа по хэш-таблицам.
//!
//! Алгоритм:
//! 1) u = hash(key); запись main index по смещению (u << 3) & 2047;
//! 2) slots == 0 - ключа нет;
//! 3) старт с ((u >> 8) % slots), линейное пробирование с заворотом;
//! 4) пустой слот (pos == 0) обрывает цепочку;
//! 5) при совпадении хэша сравниваются длина и байты ключа.
//! Цепочка обходится в порядке построения, поэтому для дубликатов побеждает
//! первая записанная запись.

use crate::codec::{check_int31, read_int31};
use crate::consts::{EMPTY_SLOT_POS, RECORD_HDR_SIZE, SLOT_SIZE};
use crate::error::Result;
use crate::hash::{cdb_hash, index_offset, start_slot};
use crate::metrics::record_lookup;

use super::core::FileReader;

/// Location of a found value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Found {
    pub data_pos: u64,
    pub data_len: u32,
}

impl FileReader {
    pub(crate) fn find(&mut self, key: &[u8]) -> Result<Option<Found>> {
        let io = self.io()?;

        let u = cdb_hash(key);
        let (table_pos, slots) = io.index_entry(index_offset(u))?;
        if slots == 0 {
            record_lookup(false, 0);
            return Ok(None);
        }

        let table_pos = u64::from(table_pos);
        let table_end = table_pos + u64::from(slots) * SLOT_SIZE as u64;
        let mut key_pos = table_pos + u64::from(start_slot(u, slots)) * SLOT_SIZE as u64;

        let mut steps = 0u64;
        for _ in 0..slots {
            steps += 1;
            let (slot_hash, rec_pos) = io.read_pair(key_pos)?;
            let rec_pos = check_int31(rec_pos)?;
            if rec_pos == EMPTY_SLOT_POS {
                break;
            }
            key_pos += SLOT_SIZE as u64;
            if key_pos == table_end {
                key_pos = table_pos;
            }
            if slot_hash != u {
                continue;
            }

            let rec_pos = u64::from(rec_pos);
            let mut hdr = [0u8; RECORD_HDR_SIZE];
            io.read_into(rec_pos, &mut hdr)?;
            let key_len = read_int31(&hdr, 0)?;
            if key_len as usize != key.len() {
                continue;
            }
            let data_len = read_int31(&hdr, 4)?;
            let stored = io.read(rec_pos + RECORD_HDR_SIZE as u64, key.len())?;
            if stored == key {
                record_lookup(true, steps);
                return Ok(Some(Found {
                    data_pos: rec_pos + RECORD_HDR_SIZE as u64 + u64::from(key_len),
                    data_len,
                }));
            }
        }

        record_lookup(false, steps);
        Ok(None)
    }

    /// Value of the first-written record with `key`, `None` if absent.
    pub fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.find(key)? {
            Some(f) => {
                let v = self.io()?.read(f.data_pos, f.data_len as usize)?;
                Ok(Some(v))
            }
            None => Ok(None),
        }
    }

    pub fn exists(&mut self, key: &[u8]) -> Result<bool> {
        Ok(self.find(key)?.is_some())
    }
}
