//! cli - командная строка `cdb FILE <command>` поверх Reader/Writer.
//!
//! Команды:
//! - get KEY       - значение ключа (сырые байты + "\n"), ничего если ключа нет
//! - list [MAX]    - ключи по одному на строку в порядке вставки
//! - match REGEX   - ключи, совпавшие с регулярным выражением (/…/ допускается)
//! - dump          - все записи в текстовой форме cdbdump
//! - make          - собрать FILE из текстовой формы cdbmake (файл или stdin)
//! - stats         - сводка по файлу и метрики поиска
//!
//! Вывод идёт в переданный `io::Write`, поэтому run() тестируется без процесса.
//! Код возврата: 0 - успех, 1 - ошибка использования или выполнения.

mod text;

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use log::debug;
use regex::bytes::Regex;
use serde::Serialize;

use crate::metrics::{self, MetricsSnapshot};
use crate::reader::FileReader;
use crate::util::{display_text, hex_dump, to_hex};
use crate::writer::FileWriter;

pub use text::{read_records, write_end, write_record};

/// Marker printed after a truncated `list`.
pub const MORE_KEYS_MARKER: &str = "(more keys exist…)";

#[derive(Parser, Debug)]
#[command(
    name = "cdb",
    version,
    about = "Read and build constant databases (cdb files)",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Path to the cdb file
    pub file: PathBuf,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Print the value of KEY
    Get {
        key: String,
        /// Hex dump instead of raw bytes
        #[arg(long, default_value_t = false)]
        hex: bool,
    },
    /// List keys in insertion order, at most MAX of them
    List {
        max: Option<usize>,
        #[command(flatten)]
        fmt: KeyFormat,
    },
    /// List keys matching a regular expression
    Match {
        pattern: String,
        #[command(flatten)]
        fmt: KeyFormat,
    },
    /// Print every record as +klen,dlen:key->data
    Dump,
    /// Build FILE from +klen,dlen:key->data records
    Make {
        /// Input file, "-" for stdin
        #[arg(long, default_value = "-")]
        from: String,
    },
    /// Print record counts and lookup metrics
    Stats {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(clap::Args, Debug, Clone, Copy)]
pub struct KeyFormat {
    /// JSON array output
    #[arg(long, default_value_t = false, conflicts_with = "hex")]
    pub json: bool,
    /// One hex-encoded key per line
    #[arg(long, default_value_t = false)]
    pub hex: bool,
}

/// Parse `args` (including argv[0]) and run the command, writing to `out`.
/// Returns the process exit code.
pub fn run<W, I, T>(out: &mut W, args: I) -> i32
where
    W: Write,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(c) => c,
        Err(e) => {
            let _ = write!(out, "{}", e.render());
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
        }
    };

    match execute(out, cli) {
        Ok(()) => 0,
        Err(e) => {
            let _ = writeln!(out, "error: {:#}", e);
            1
        }
    }
}

pub fn execute<W: Write>(out: &mut W, cli: Cli) -> Result<()> {
    debug!("cdb cli: {:?}", cli.cmd);
    match cli.cmd {
        Cmd::Get { key, hex } => cmd_get(out, &cli.file, &key, hex),
        Cmd::List { max, fmt } => cmd_list(out, &cli.file, max, fmt),
        Cmd::Match { pattern, fmt } => cmd_match(out, &cli.file, &pattern, fmt),
        Cmd::Dump => cmd_dump(out, &cli.file),
        Cmd::Make { from } => cmd_make(out, &cli.file, &from),
        Cmd::Stats { json } => cmd_stats(out, &cli.file, json),
    }
}

fn open_reader(path: &Path) -> Result<FileReader> {
    FileReader::open(path).with_context(|| format!("open {}", path.display()))
}

fn write_line<W: Write>(out: &mut W, bytes: &[u8]) -> Result<()> {
    out.write_all(bytes)?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Keys one per line (raw or hex), or a JSON array of lossy UTF-8 strings.
fn write_keys<W: Write>(out: &mut W, keys: &[Vec<u8>], fmt: KeyFormat) -> Result<()> {
    if fmt.json {
        let text: Vec<String> = keys
            .iter()
            .map(|k| String::from_utf8_lossy(k).into_owned())
            .collect();
        writeln!(out, "{}", serde_json::to_string(&text)?)?;
        return Ok(());
    }
    for key in keys {
        if fmt.hex {
            writeln!(out, "{}", to_hex(key))?;
        } else {
            write_line(out, key)?;
        }
    }
    Ok(())
}

fn cmd_get<W: Write>(out: &mut W, path: &Path, key: &str, hex: bool) -> Result<()> {
    let mut r = open_reader(path)?;
    match r.get(key.as_bytes())? {
        Some(v) if hex => writeln!(out, "{}", hex_dump(&v))?,
        Some(v) => write_line(out, &v)?,
        None => debug!("cdb cli: key {:?} not found", key),
    }
    Ok(())
}

fn cmd_list<W: Write>(out: &mut W, path: &Path, max: Option<usize>, fmt: KeyFormat) -> Result<()> {
    let mut r = open_reader(path)?;
    let mut keys = Vec::new();
    let mut more = false;

    let mut k = r.firstkey()?;
    while let Some(key) = k {
        if max.map_or(false, |m| keys.len() >= m) {
            more = true;
            break;
        }
        keys.push(key);
        k = r.nextkey()?;
    }

    write_keys(out, &keys, fmt)?;
    if more && !fmt.json {
        writeln!(out, "\n{MORE_KEYS_MARKER}")?;
    }
    Ok(())
}

/// Accepts both `re` and `/re/`.
fn compile_pattern(pattern: &str) -> Result<Regex> {
    let body = if pattern.len() >= 2 && pattern.starts_with('/') && pattern.ends_with('/') {
        &pattern[1..pattern.len() - 1]
    } else {
        pattern
    };
    Regex::new(body).map_err(|e| anyhow!("invalid pattern {pattern:?}: {e}"))
}

fn cmd_match<W: Write>(out: &mut W, path: &Path, pattern: &str, fmt: KeyFormat) -> Result<()> {
    let re = compile_pattern(pattern)?;
    let mut r = open_reader(path)?;
    let mut hits = Vec::new();
    for key in r.keys()? {
        let key = key?;
        if re.is_match(&key) {
            hits.push(key);
        }
    }
    write_keys(out, &hits, fmt)
}

fn cmd_dump<W: Write>(out: &mut W, path: &Path) -> Result<()> {
    let mut r = open_reader(path)?;
    for rec in r.records()? {
        let (k, v) = rec?;
        write_record(out, &k, &v)?;
    }
    write_end(out)
}

fn cmd_make<W: Write>(out: &mut W, path: &Path, from: &str) -> Result<()> {
    let mut w = FileWriter::create(path).with_context(|| format!("create {}", path.display()))?;
    let parsed = if from == "-" {
        let stdin = io::stdin();
        let mut lock = stdin.lock();
        read_records(&mut lock, |k, v| Ok(w.set(k, v)?))
    } else {
        File::open(from)
            .with_context(|| format!("open {from}"))
            .and_then(|f| read_records(&mut BufReader::new(f), |k, v| Ok(w.set(k, v)?)))
    };
    // при ошибке ввода целевой файл не создаётся
    let count = match parsed {
        Ok(n) => n,
        Err(e) => {
            w.abandon();
            return Err(e);
        }
    };
    w.close()
        .with_context(|| format!("publish {}", path.display()))?;
    writeln!(out, "{count} record(s) written to {}", path.display())?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct FileStats {
    path: String,
    file_size: u64,
    records: u64,
    distinct_keys: u64,
    key_bytes: u64,
    value_bytes: u64,
    records_end: u64,
    metrics: MetricsSnapshot,
}

fn cmd_stats<W: Write>(out: &mut W, path: &Path, json: bool) -> Result<()> {
    let file_size = std::fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?
        .len();
    let mut r = open_reader(path)?;
    let records_end = r.records_end()?;

    let mut keys = Vec::new();
    let (mut key_bytes, mut value_bytes) = (0u64, 0u64);
    for rec in r.records()? {
        let (k, v) = rec?;
        key_bytes += k.len() as u64;
        value_bytes += v.len() as u64;
        keys.push(k);
    }
    let records = keys.len() as u64;
    keys.sort();
    keys.dedup();

    // Прогоняем поиск по каждому ключу, чтобы получить метрики пробирования.
    metrics::reset();
    for k in &keys {
        if !r.exists(k)? {
            return Err(anyhow!(
                "key {:?} is listed but not found via hash tables",
                display_text(k)
            ));
        }
    }
    let m = metrics::snapshot();

    let stats = FileStats {
        path: path.display().to_string(),
        file_size,
        records,
        distinct_keys: keys.len() as u64,
        key_bytes,
        value_bytes,
        records_end,
        metrics: m,
    };

    if json {
        writeln!(out, "{}", serde_json::to_string(&stats)?)?;
        return Ok(());
    }
    writeln!(out, "file:          {}", stats.path)?;
    writeln!(out, "size:          {} B", stats.file_size)?;
    writeln!(out, "records:       {}", stats.records)?;
    writeln!(out, "distinct keys: {}", stats.distinct_keys)?;
    writeln!(out, "key bytes:     {}", stats.key_bytes)?;
    writeln!(out, "value bytes:   {}", stats.value_bytes)?;
    writeln!(out, "records end:   {}", stats.records_end)?;
    writeln!(
        out,
        "lookups:       {} (hit ratio {:.2}, avg probes {:.2})",
        stats.metrics.lookups_total,
        stats.metrics.hit_ratio(),
        stats.metrics.avg_probe_steps()
    )?;
    writeln!(
        out,
        "reads:         {} from file, buffer hit ratio {:.2}",
        stats.metrics.file_reads,
        stats.metrics.buffer_hit_ratio()
    )?;
    Ok(())
}
