use crate::error::{Error, Result};
use crate::utils::trace_name;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// Default workload list, relative to the directory the tool runs in.
pub const DEFAULT_TRACES: &[&str] = &[
    "./traces/amptjp.rep",
    "./traces/bash.rep",
    "./traces/boat.rep",
    "./traces/binary2-bal.rep",
    "./traces/cccp.rep",
    "./traces/cccp-bal.rep",
    "./traces/chrome.rep",
    "./traces/coalesce-big.rep",
    "./traces/cp-decl.rep",
    "./traces/exhaust.rep",
    "./traces/expr-bal.rep",
    "./traces/freeciv.rep",
    "./traces/ls.rep",
    "./traces/perl.rep",
];

/// One parsed trace line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    Allocate { id: i64, size: u64 },
    Reallocate { id: i64, size: u64 },
    Free { id: i64 },
}

/// Why a line contributed nothing to the tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Does not start with a letter: header counts, blank lines.
    NotARecord,
    /// Pointer id or size is missing where required or not an integer.
    Malformed,
    /// `a`/`r` line without a size.
    MissingSize,
    UnknownAction,
    /// Free of a pointer that is not currently mapped to a size.
    UnmatchedFree,
}

pub fn parse_line(line: &str) -> std::result::Result<Record, SkipReason> {
    if !line.chars().next().is_some_and(char::is_alphabetic) {
        return Err(SkipReason::NotARecord);
    }

    let mut parts = line.split_whitespace();
    let action = parts.next().ok_or(SkipReason::NotARecord)?;
    let id: i64 = parts
        .next()
        .and_then(|tok| tok.parse().ok())
        .ok_or(SkipReason::Malformed)?;
    let size = match parts.next() {
        Some(tok) => Some(tok.parse::<u64>().map_err(|_| SkipReason::Malformed)?),
        None => None,
    };

    match action {
        "a" => size.map(|size| Record::Allocate { id, size }).ok_or(SkipReason::MissingSize),
        "r" => size.map(|size| Record::Reallocate { id, size }).ok_or(SkipReason::MissingSize),
        "f" => Ok(Record::Free { id }),
        _ => Err(SkipReason::UnknownAction),
    }
}

/// Size -> count, remembering the order in which sizes were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: HashMap<u64, u64>,
    order: Vec<u64>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, size: u64) {
        let count = self.counts.entry(size).or_insert_with(|| {
            self.order.push(size);
            0
        });
        *count += 1;
    }

    pub fn get(&self, size: u64) -> u64 {
        self.counts.get(&size).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// `(size, count)` in first-encounter order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.order.iter().map(|size| (*size, self.counts[size]))
    }

    /// Most frequent first; equal counts keep first-encounter order.
    pub fn by_frequency(&self) -> Vec<(u64, u64)> {
        let mut rows: Vec<_> = self.iter().collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        rows
    }

    /// Ascending by size, for plotting.
    pub fn by_size(&self) -> Vec<(u64, u64)> {
        let mut rows: Vec<_> = self.iter().collect();
        rows.sort_by_key(|&(size, _)| size);
        rows
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub files_read: usize,
    pub files_skipped: usize,
    pub records: usize,
    pub skipped: HashMap<SkipReason, usize>,
}

impl IngestStats {
    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    fn merge(&mut self, other: &IngestStats) {
        self.files_read += other.files_read;
        self.files_skipped += other.files_skipped;
        self.records += other.records;
        for (reason, n) in &other.skipped {
            *self.skipped.entry(*reason).or_insert(0) += n;
        }
    }
}

/// The four tables one run produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTables {
    pub alloc: FrequencyTable,
    pub realloc: FrequencyTable,
    pub combined: FrequencyTable,
    pub free: FrequencyTable,
}

/// Owns every piece of mutable state for one aggregation run.
#[derive(Debug, Default)]
pub struct Aggregator {
    tables: FrequencyTables,
    live: HashMap<i64, u64>,
    stats: IngestStats,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, record: Record) -> std::result::Result<(), SkipReason> {
        match record {
            Record::Allocate { id, size } => {
                self.tables.alloc.increment(size);
                self.tables.combined.increment(size);
                self.live.insert(id, size);
            }
            Record::Reallocate { id, size } => {
                self.tables.realloc.increment(size);
                self.tables.combined.increment(size);
                self.live.insert(id, size);
            }
            Record::Free { id } => {
                let size = self.live.remove(&id).ok_or(SkipReason::UnmatchedFree)?;
                self.tables.free.increment(size);
            }
        }
        Ok(())
    }

    /// Feeds every line of `reader` through the parser. Bytes that are not
    /// UTF-8 are replaced rather than failing the file.
    pub fn ingest_reader<R: BufRead>(&mut self, mut reader: R) -> std::io::Result<IngestStats> {
        let mut stats = IngestStats::default();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let text = String::from_utf8_lossy(&buf);
            let line = text.trim_end_matches(|c: char| c == '\n' || c == '\r');
            let outcome = parse_line(line).and_then(|record| self.apply(record));
            match outcome {
                Ok(()) => stats.records += 1,
                Err(reason) => {
                    if reason != SkipReason::NotARecord {
                        tracing::trace!(?reason, line, "Skipped trace line");
                    }
                    *stats.skipped.entry(reason).or_insert(0) += 1;
                }
            }
        }
        Ok(stats)
    }

    /// Reads one trace file. Files that cannot be opened are logged and
    /// skipped so the rest of the corpus still counts.
    pub fn ingest_file(&mut self, path: &Path) -> Result<()> {
        let name = trace_name(path);
        let reader = match open_trace(path) {
            Ok(reader) => reader,
            Err(e) => {
                tracing::warn!(trace = %name, path = %path.display(), error = %e, "Skipping unreadable trace");
                self.stats.files_skipped += 1;
                return Ok(());
            }
        };

        let mut stats = self.ingest_reader(reader).map_err(|e| Error::io(path, e))?;
        stats.files_read = 1;
        tracing::info!(
            trace = %name,
            records = stats.records,
            malformed = stats.skipped(SkipReason::Malformed) + stats.skipped(SkipReason::MissingSize),
            unmatched_frees = stats.skipped(SkipReason::UnmatchedFree),
            live = self.live.len(),
            "Parsed trace"
        );
        self.stats.merge(&stats);
        Ok(())
    }

    pub fn tables(&self) -> &FrequencyTables {
        &self.tables
    }

    pub fn live_pointers(&self) -> usize {
        self.live.len()
    }

    pub fn finish(self) -> (FrequencyTables, IngestStats) {
        (self.tables, self.stats)
    }
}

/// Runs a fresh aggregation over `paths`, in order.
pub fn ingest<P: AsRef<Path>>(paths: &[P]) -> Result<(FrequencyTables, IngestStats)> {
    let mut aggregator = Aggregator::new();
    for path in paths {
        aggregator.ingest_file(path.as_ref())?;
    }
    Ok(aggregator.finish())
}

/// Opens a trace for line reading, decompressing `.zst` files on the fly.
pub fn open_trace(path: &Path) -> std::io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let inner: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "zst") {
        Box::new(zstd::Decoder::new(file)?)
    } else {
        Box::new(file)
    };
    Ok(Box::new(BufReader::new(inner)))
}

pub fn default_trace_paths() -> Vec<PathBuf> {
    DEFAULT_TRACES.iter().map(PathBuf::from).collect()
}
