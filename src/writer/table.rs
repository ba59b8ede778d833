//! writer/table - построение хэш-таблиц при закрытии writer'а.
//!
//! Для каждого из 256 bucket'ов с n записями: таблица из 2n слотов,
//! открытая адресация с линейным пробированием. Записи раскладываются в
//! порядке вставки - от этого зависят и порядок цепочек при поиске
//! (первый записанный дубликат находится первым), и побайтовая
//! детерминированность файла.

use crate::codec::encode_pair;
use crate::consts::{BUCKETS, EMPTY_SLOT_POS, SLOT_SIZE};
use crate::hash::{bucket_index, start_slot};

/// (hash, record_pos) of one written record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotEntry {
    pub hash: u32,
    pub pos: u32,
}

/// Per-bucket lists of written records, in insertion order.
#[derive(Debug)]
pub(crate) struct Buckets {
    lists: Vec<Vec<SlotEntry>>,
}

impl Buckets {
    pub(crate) fn new() -> Self {
        Self {
            lists: vec![Vec::new(); BUCKETS],
        }
    }

    pub(crate) fn push(&mut self, hash: u32, pos: u32) {
        self.lists[bucket_index(hash)].push(SlotEntry { hash, pos });
    }

    pub(crate) fn bucket(&self, i: usize) -> &[SlotEntry] {
        &self.lists[i]
    }
}

/// Slot array of one sub-table: 2n slots, empty ones have pos == 0.
pub(crate) fn build_table(entries: &[SlotEntry]) -> Vec<SlotEntry> {
    let slots = entries.len() * 2;
    let mut table = vec![
        SlotEntry {
            hash: 0,
            pos: EMPTY_SLOT_POS
        };
        slots
    ];
    for e in entries {
        let mut i = start_slot(e.hash, slots as u32) as usize;
        while table[i].pos != EMPTY_SLOT_POS {
            i += 1;
            if i == slots {
                i = 0;
            }
        }
        table[i] = *e;
    }
    table
}

/// On-disk bytes of a slot array.
pub(crate) fn encode_table(table: &[SlotEntry]) -> Vec<u8> {
    let mut out = Vec::with_capacity(table.len() * SLOT_SIZE);
    for s in table {
        out.extend_from_slice(&encode_pair(s.hash, s.pos));
    }
    out
}
