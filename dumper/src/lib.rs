//! Redis keyspace dumper
//!
//! Walks a Redis keyspace and writes every key's value and expiry as a RESP
//! command log that can be replayed against an empty instance
//! (`redis-cli --pipe < backup.resp`).

pub mod commands;
pub mod engine;
pub mod errors;
pub mod resp;
pub mod store;
pub mod types;
pub mod validate;

// Re-export commonly used types
pub use engine::{run_dump, ScanDumpEngine};
pub use errors::DumpError;
pub use store::{RedisStore, StoreConnector};
pub use types::{Command, Cursor, DumpOptions, DumpProgress, KeyType, KeyValue, ProgressSnapshot};
