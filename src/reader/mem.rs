//! reader/mem - MemReader: контракт Reader поверх списка пар в памяти.
//!
//! Для тестов и моков без файлового I/O. Порядок ключей - порядок вставки;
//! для повторяющегося ключа get() возвращает первое значение, как и cdb-файл.

use std::collections::HashMap;

use crate::error::Result;

use super::Reader;

#[derive(Debug, Default, Clone)]
pub struct MemReader {
    pairs: Vec<(Vec<u8>, Vec<u8>)>,
    // key -> индекс первой пары с этим ключом
    first: HashMap<Vec<u8>, usize>,
    cursor: usize,
}

impl MemReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
    {
        let mut r = Self::new();
        for (k, v) in pairs {
            r.insert(k, v);
        }
        r
    }

    /// Append a pair; an existing key keeps its first value for get().
    pub fn insert<K: Into<Vec<u8>>, V: Into<Vec<u8>>>(&mut self, key: K, value: V) {
        let key = key.into();
        let idx = self.pairs.len();
        self.first.entry(key.clone()).or_insert(idx);
        self.pairs.push((key, value.into()));
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Reader for MemReader {
    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.first.get(key).map(|&i| self.pairs[i].1.clone()))
    }

    fn exists(&mut self, key: &[u8]) -> Result<bool> {
        Ok(self.first.contains_key(key))
    }

    fn firstkey(&mut self) -> Result<Option<Vec<u8>>> {
        self.cursor = 0;
        self.nextkey()
    }

    fn nextkey(&mut self) -> Result<Option<Vec<u8>>> {
        match self.pairs.get(self.cursor) {
            Some((k, _)) => {
                self.cursor += 1;
                Ok(Some(k.clone()))
            }
            None => Ok(None),
        }
    }

    /// Drops all pairs: later lookups report absent.
    fn close(&mut self) {
        self.pairs.clear();
        self.first.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_two() -> MemReader {
        MemReader::from_pairs([("one", "ONE"), ("two", "TWO")])
    }

    #[test]
    fn get_and_exists() -> Result<()> {
        let mut r = MemReader::from_pairs([("foo", "FOO")]);
        assert_eq!(r.get(b"foo")?, Some(b"FOO".to_vec()));
        assert_eq!(r.get(b"xyz")?, None);
        assert!(r.exists(b"foo")?);
        assert!(!r.exists(b"xyz")?);
        Ok(())
    }

    #[test]
    fn close_forgets_everything() -> Result<()> {
        let mut r = MemReader::from_pairs([("foo", "FOO")]);
        r.close();
        r.close();
        assert_eq!(r.get(b"foo")?, None);
        assert_eq!(r.firstkey()?, None);
        Ok(())
    }

    #[test]
    fn firstkey_resets_cursor() -> Result<()> {
        let mut r = one_two();
        assert_eq!(r.firstkey()?, Some(b"one".to_vec()));
        assert_eq!(r.firstkey()?, Some(b"one".to_vec()));
        r.nextkey()?;
        assert_eq!(r.firstkey()?, Some(b"one".to_vec()));
        Ok(())
    }

    #[test]
    fn nextkey_walks_in_insertion_order() -> Result<()> {
        let mut r = one_two();
        // без firstkey курсор стоит на первом ключе
        assert_eq!(r.nextkey()?, Some(b"one".to_vec()));
        assert_eq!(r.nextkey()?, Some(b"two".to_vec()));

        r.firstkey()?;
        assert_eq!(r.nextkey()?, Some(b"two".to_vec()));
        assert_eq!(r.nextkey()?, None);

        r.firstkey()?;
        assert_eq!(r.nextkey()?, Some(b"two".to_vec()));
        Ok(())
    }

    #[test]
    fn empty_reader() -> Result<()> {
        let mut r = MemReader::new();
        assert!(r.is_empty());
        assert_eq!(r.firstkey()?, None);
        Ok(())
    }

    #[test]
    fn duplicate_keys_keep_first_value() -> Result<()> {
        let mut r = MemReader::from_pairs([("k", "first"), ("k", "second")]);
        assert_eq!(r.len(), 2);
        assert_eq!(r.get(b"k")?, Some(b"first".to_vec()));
        assert_eq!(r.firstkey()?, Some(b"k".to_vec()));
        assert_eq!(r.nextkey()?, Some(b"k".to_vec()));
        assert_eq!(r.nextkey()?, None);
        Ok(())
    }
}
