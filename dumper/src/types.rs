use clap::Args;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Semaphore;

use crate::errors::DumpError;

// === KEYSPACE MODEL ===

/// Kind of value stored under a key, as reported by `TYPE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyType {
    String,
    List,
    Set,
    Hash,
    SortedSet,
    /// Key does not exist (anymore)
    None,
    Unknown(String),
}

impl KeyType {
    pub fn parse(reply: &str) -> Self {
        match reply {
            "string" => KeyType::String,
            "list" => KeyType::List,
            "set" => KeyType::Set,
            "hash" => KeyType::Hash,
            "zset" => KeyType::SortedSet,
            "none" => KeyType::None,
            other => KeyType::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            KeyType::String => "string",
            KeyType::List => "list",
            KeyType::Set => "set",
            KeyType::Hash => "hash",
            KeyType::SortedSet => "zset",
            KeyType::None => "none",
            KeyType::Unknown(name) => name,
        }
    }
}

/// Materialized current value of one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyValue {
    String(String),
    List(Vec<String>),
    Set(BTreeSet<String>),
    Hash(BTreeMap<String, String>),
    /// Key exists but its type cannot be dumped
    Unsupported(KeyType),
    /// Key is absent, or vanished between the type check and the read
    Missing,
}

/// Incremental enumeration position for SCAN / SSCAN / HSCAN
///
/// The server hands back `0` when the enumeration has wrapped around; callers
/// must go through [`Cursor::is_complete`] rather than comparing raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor(u64);

impl Cursor {
    pub const START: Cursor = Cursor(0);

    pub fn new(position: u64) -> Self {
        Cursor(position)
    }

    pub fn position(&self) -> u64 {
        self.0
    }

    pub fn is_complete(&self) -> bool {
        self.0 == 0
    }
}

/// One replayable write command: name followed by its arguments. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command(Vec<String>);

impl Command {
    pub fn new(name: &str, key: &str) -> Self {
        Command(vec![name.to_string(), key.to_string()])
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.0.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.0[0]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<String>> for Command {
    type Error = DumpError;

    fn try_from(args: Vec<String>) -> Result<Self, Self::Error> {
        if args.is_empty() {
            return Err(DumpError::invalid_options("command", "must have a name"));
        }
        Ok(Command(args))
    }
}

// === DUMP OPTIONS ===

/// Per-run dump settings, read from TOML by the manager and from flags by
/// the `dumper` binary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Args)]
pub struct DumpOptions {
    /// Match pattern for SCAN
    #[serde(default = "default_keys_match")]
    #[arg(long = "keys", default_value = "*")]
    pub keys_match: String,
    /// Database index to dump
    #[serde(default)]
    #[arg(long, default_value_t = 0)]
    pub db: u32,
    /// Maximum number of key batches dumped concurrently
    #[serde(default = "default_workers")]
    #[arg(long, default_value_t = default_workers())]
    pub workers: usize,
    /// COUNT hint for SCAN, SSCAN and HSCAN
    #[serde(default = "default_scan_batch_size")]
    #[arg(long, default_value_t = default_scan_batch_size())]
    pub scan_batch_size: usize,
    /// Maximum elements (or field/value pairs) per RPUSH, SADD, HSET
    #[serde(default = "default_cmd_batch_size")]
    #[arg(long, default_value_t = default_cmd_batch_size())]
    pub cmd_batch_size: usize,
}

fn default_keys_match() -> String {
    "*".to_string()
}

fn default_workers() -> usize {
    1
}

fn default_scan_batch_size() -> usize {
    100
}

fn default_cmd_batch_size() -> usize {
    1000
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            keys_match: default_keys_match(),
            db: 0,
            workers: default_workers(),
            scan_batch_size: default_scan_batch_size(),
            cmd_batch_size: default_cmd_batch_size(),
        }
    }
}

impl DumpOptions {
    pub fn validate(&self) -> Result<(), DumpError> {
        if self.keys_match.is_empty() {
            return Err(DumpError::invalid_options("keys_match", "must not be empty"));
        }
        if self.workers == 0 {
            return Err(DumpError::invalid_options("workers", "must be at least 1"));
        }
        if self.workers > Semaphore::MAX_PERMITS {
            return Err(DumpError::invalid_options(
                "workers",
                &format!("must be at most {}", Semaphore::MAX_PERMITS),
            ));
        }
        if self.scan_batch_size == 0 {
            return Err(DumpError::invalid_options("scan_batch_size", "must be at least 1"));
        }
        if self.cmd_batch_size == 0 {
            return Err(DumpError::invalid_options("cmd_batch_size", "must be at least 1"));
        }
        Ok(())
    }
}

// === PROGRESS ===

/// Live `(keys_processed, keys_total)` counters for an external renderer
#[derive(Debug, Default)]
pub struct DumpProgress {
    running: AtomicBool,
    keys_processed: AtomicU64,
    keys_total: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub running: bool,
    pub keys_processed: u64,
    pub keys_total: u64,
}

impl DumpProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, keys_total: u64) {
        self.keys_processed.store(0, Ordering::Relaxed);
        self.keys_total.store(keys_total, Ordering::Relaxed);
        self.running.store(true, Ordering::Relaxed);
    }

    pub fn advance(&self, keys: u64) {
        self.keys_processed.fetch_add(keys, Ordering::Relaxed);
    }

    pub fn finish(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            running: self.running.load(Ordering::Relaxed),
            keys_processed: self.keys_processed.load(Ordering::Relaxed),
            keys_total: self.keys_total.load(Ordering::Relaxed),
        }
    }
}
