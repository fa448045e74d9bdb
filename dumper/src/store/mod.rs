//! Read access to the store being backed up
//!
//! [`StoreConnector`] is the only seam between the dump engine and the
//! network. The production implementation is [`RedisStore`]; tests plug in an
//! in-memory keyspace. Every operation may fail with a connection or protocol
//! error, which is returned to the caller as-is: there is no local retry.

pub mod redis_store;

pub use redis_store::{redact_url, resolve_redis_url, RedisStore};

use async_trait::async_trait;

use crate::errors::DumpError;
use crate::types::{Cursor, KeyType};

#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn ping(&self) -> Result<(), DumpError>;

    /// Switch the connection to database index `db`.
    async fn select(&self, db: u32) -> Result<(), DumpError>;

    /// Number of keys in the selected database (`DBSIZE`).
    async fn key_count(&self) -> Result<u64, DumpError>;

    /// One round of keyspace enumeration (`SCAN cursor MATCH pattern COUNT page_size`).
    async fn scan(
        &self,
        cursor: Cursor,
        pattern: &str,
        page_size: usize,
    ) -> Result<(Cursor, Vec<String>), DumpError>;

    async fn key_type(&self, key: &str) -> Result<KeyType, DumpError>;

    /// String value, or `None` when the key is gone.
    async fn get(&self, key: &str) -> Result<Option<String>, DumpError>;

    async fn list_range(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, DumpError>;

    async fn set_scan(
        &self,
        key: &str,
        cursor: Cursor,
        page_size: usize,
    ) -> Result<(Cursor, Vec<String>), DumpError>;

    async fn hash_scan(
        &self,
        key: &str,
        cursor: Cursor,
        page_size: usize,
    ) -> Result<(Cursor, Vec<(String, String)>), DumpError>;

    /// Remaining time to live in seconds. Zero or negative means the key has
    /// no expiry or does not exist.
    async fn ttl(&self, key: &str) -> Result<i64, DumpError>;
}
