use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use ConstDB::{open_reader, open_writer, CdbBuilder, FileReader, FileWriter, MemReader, Reader};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base = std::env::temp_dir();
    base.join(format!("cdbtest-rt-{prefix}-{pid}-{t}-{id}"))
}

fn write_pairs<K: AsRef<[u8]>, V: AsRef<[u8]>>(path: &PathBuf, pairs: &[(K, V)]) -> Result<()> {
    let cfg = CdbBuilder::from_default().fsync(false).build();
    let mut w = FileWriter::create_with_config(path, cfg)?;
    for (k, v) in pairs {
        w.set(k.as_ref(), v.as_ref())?;
    }
    w.close()?;
    Ok(())
}

fn collect_keys(r: &mut dyn Reader) -> Result<Vec<Vec<u8>>> {
    let mut out = Vec::new();
    let mut k = r.firstkey()?;
    while let Some(key) = k {
        out.push(key);
        k = r.nextkey()?;
    }
    Ok(out)
}

#[test]
fn concrete_scenario() -> Result<()> {
    let root = unique_root("scenario");
    fs::create_dir_all(&root)?;
    let path = root.join("test.cdb");

    write_pairs(
        &path,
        &[
            ("foo", "bar"),
            ("answer", "42"),
            ("false", "0"),
            ("true", "1"),
        ],
    )?;

    let mut r = FileReader::open(&path)?;
    let keys = collect_keys(&mut r)?;
    assert_eq!(
        keys,
        vec![
            b"foo".to_vec(),
            b"answer".to_vec(),
            b"false".to_vec(),
            b"true".to_vec()
        ]
    );
    assert_eq!(r.get(b"answer")?.as_deref(), Some(&b"42"[..]));
    assert_eq!(r.get(b"false")?.as_deref(), Some(&b"0"[..]));
    assert_eq!(r.get(b"missing")?, None);
    assert!(r.exists(b"foo")?);
    assert!(!r.exists(b"missing")?);
    Ok(())
}

#[test]
fn random_pairs_round_trip() -> Result<()> {
    let root = unique_root("random");
    fs::create_dir_all(&root)?;
    let path = root.join("random.cdb");

    let mut rng = oorandom::Rand32::new(0xC0DB);
    let mut seen = HashSet::new();
    let mut pairs: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
    while pairs.len() < 2000 {
        let klen = rng.rand_range(0..24) as usize;
        let vlen = rng.rand_range(0..300) as usize;
        let key: Vec<u8> = (0..klen).map(|_| rng.rand_u32() as u8).collect();
        if !seen.insert(key.clone()) {
            continue;
        }
        let value: Vec<u8> = (0..vlen).map(|_| rng.rand_u32() as u8).collect();
        pairs.push((key, value));
    }

    {
        let cfg = CdbBuilder::from_default().fsync(false).build();
        let mut w = FileWriter::create_with_config(&path, cfg)?;
        for (k, v) in &pairs {
            w.set(k, v)?;
        }
        assert_eq!(w.len(), pairs.len());
        w.close()?;
    }

    // маленький read-ahead: больше чтений мимо буфера
    let cfg = CdbBuilder::from_default().read_ahead(8).build();
    let mut r = FileReader::open_with_config(&path, cfg)?;
    for (k, v) in &pairs {
        assert_eq!(r.get(k)?.as_ref(), Some(v), "key {:?}", k);
        assert!(r.exists(k)?);
    }
    for i in 0..500u32 {
        let absent = format!("never-written-{i}-{}", "x".repeat(30));
        assert_eq!(r.get(absent.as_bytes())?, None);
        assert!(!r.exists(absent.as_bytes())?);
    }

    // iteration yields every key exactly once, in insertion order
    let keys = collect_keys(&mut r)?;
    let expect: Vec<Vec<u8>> = pairs.iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(keys, expect);
    Ok(())
}

#[test]
fn empty_key_and_value() -> Result<()> {
    let root = unique_root("empty-kv");
    fs::create_dir_all(&root)?;
    let path = root.join("e.cdb");

    write_pairs(&path, &[("", "nothing"), ("k", "")])?;

    let mut r = FileReader::open(&path)?;
    assert_eq!(r.get(b"")?.as_deref(), Some(&b"nothing"[..]));
    assert_eq!(r.get(b"k")?.as_deref(), Some(&b""[..]));
    assert!(r.exists(b"k")?);
    Ok(())
}

#[test]
fn duplicate_keys_first_wins() -> Result<()> {
    let root = unique_root("dups");
    fs::create_dir_all(&root)?;
    let path = root.join("d.cdb");

    write_pairs(&path, &[("k", "first"), ("other", "x"), ("k", "second")])?;

    let mut r = FileReader::open(&path)?;
    assert_eq!(r.get(b"k")?.as_deref(), Some(&b"first"[..]));

    // обход видит обе записи
    let records: Vec<(Vec<u8>, Vec<u8>)> = r.records()?.collect::<ConstDB::Result<_>>()?;
    assert_eq!(records.len(), 3);
    assert_eq!(records[2], (b"k".to_vec(), b"second".to_vec()));
    Ok(())
}

#[test]
fn iteration_restarts_and_nextkey_works_first() -> Result<()> {
    let root = unique_root("iter");
    fs::create_dir_all(&root)?;
    let path = root.join("i.cdb");

    write_pairs(&path, &[("one", "1"), ("two", "2")])?;

    let mut r = FileReader::open(&path)?;
    // nextkey без firstkey начинает с первой записи
    assert_eq!(r.nextkey()?.as_deref(), Some(&b"one"[..]));
    assert_eq!(r.nextkey()?.as_deref(), Some(&b"two"[..]));
    assert_eq!(r.nextkey()?, None);
    assert_eq!(r.nextkey()?, None);

    assert_eq!(r.firstkey()?.as_deref(), Some(&b"one"[..]));
    // lookups between steps do not disturb the cursor
    assert_eq!(r.get(b"two")?.as_deref(), Some(&b"2"[..]));
    assert_eq!(r.nextkey()?.as_deref(), Some(&b"two"[..]));

    let keys: Vec<Vec<u8>> = r.keys()?.collect::<ConstDB::Result<_>>()?;
    assert_eq!(keys, vec![b"one".to_vec(), b"two".to_vec()]);
    Ok(())
}

#[test]
fn empty_database() -> Result<()> {
    let root = unique_root("empty");
    fs::create_dir_all(&root)?;
    let path = root.join("empty.cdb");

    FileWriter::create_with_config(&path, CdbBuilder::from_default().fsync(false).build())?
        .close()?;
    assert_eq!(fs::metadata(&path)?.len(), 2048);

    let mut r = FileReader::open(&path)?;
    assert_eq!(r.records_end()?, 2048);
    assert_eq!(r.firstkey()?, None);
    assert_eq!(r.get(b"anything")?, None);
    assert!(!r.exists(b"")?);
    Ok(())
}

#[test]
fn writes_are_deterministic() -> Result<()> {
    let root = unique_root("determinism");
    fs::create_dir_all(&root)?;
    let a = root.join("a.cdb");
    let b = root.join("b.cdb");

    let pairs: Vec<(Vec<u8>, Vec<u8>)> = (0..300u32)
        .map(|i| (format!("key-{i}").into_bytes(), format!("value-{}", i * 7).into_bytes()))
        .collect();
    write_pairs(&a, &pairs)?;
    write_pairs(&b, &pairs)?;
    assert_eq!(fs::read(&a)?, fs::read(&b)?);
    Ok(())
}

#[test]
fn trait_objects_and_factories() -> Result<()> {
    let root = unique_root("factories");
    fs::create_dir_all(&root)?;
    let path = root.join("f.cdb");

    {
        let mut w = open_writer(&path)?;
        w.set(b"alpha", b"1")?;
        w.set(b"beta", b"2")?;
        w.close()?;
    }

    let mut file = open_reader(&path)?;
    let mut mem: Box<dyn Reader> = Box::new(MemReader::from_pairs(vec![
        (b"alpha".to_vec(), b"1".to_vec()),
        (b"beta".to_vec(), b"2".to_vec()),
    ]));

    // обе реализации ведут себя одинаково
    for r in [&mut file, &mut mem] {
        assert_eq!(r.get(b"beta")?.as_deref(), Some(&b"2"[..]));
        assert!(!r.exists(b"gamma")?);
        assert_eq!(collect_keys(&mut **r)?, vec![b"alpha".to_vec(), b"beta".to_vec()]);
        r.close();
        r.close();
    }
    Ok(())
}
