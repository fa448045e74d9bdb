use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use std::time::Instant;
use tracing::{debug, info};

use super::StoreConnector;
use crate::errors::DumpError;
use crate::types::{Cursor, KeyType};

/// Redis connection shared by every in-flight dump task.
///
/// The multiplexed connection pipelines concurrent requests over a single
/// socket, so cloning it per call is cheap and keeps requests independent.
#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, DumpError> {
        let connection_error = |e: redis::RedisError| DumpError::Connection {
            url: redact_url(redis_url),
            reason: e.to_string(),
        };

        let client = redis::Client::open(redis_url).map_err(connection_error)?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(connection_error)?;

        debug!("Connected to {}", redact_url(redis_url));
        Ok(Self { connection })
    }

    fn conn(&self) -> MultiplexedConnection {
        self.connection.clone()
    }
}

#[async_trait]
impl StoreConnector for RedisStore {
    async fn ping(&self) -> Result<(), DumpError> {
        let started = Instant::now();
        let _pong: String = redis::cmd("PING")
            .query_async(&mut self.conn())
            .await
            .map_err(|e| DumpError::store("PING", None, e))?;
        info!("Redis ping returned in {:.4} sec", started.elapsed().as_secs_f64());
        Ok(())
    }

    async fn select(&self, db: u32) -> Result<(), DumpError> {
        let _: () = redis::cmd("SELECT")
            .arg(db)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| DumpError::store("SELECT", None, e))?;
        Ok(())
    }

    async fn key_count(&self) -> Result<u64, DumpError> {
        let count: u64 = redis::cmd("DBSIZE")
            .query_async(&mut self.conn())
            .await
            .map_err(|e| DumpError::store("DBSIZE", None, e))?;
        Ok(count)
    }

    async fn scan(
        &self,
        cursor: Cursor,
        pattern: &str,
        page_size: usize,
    ) -> Result<(Cursor, Vec<String>), DumpError> {
        let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor.position())
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(page_size)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| DumpError::store("SCAN", None, e))?;
        Ok((Cursor::new(next), keys))
    }

    async fn key_type(&self, key: &str) -> Result<KeyType, DumpError> {
        let reply: String = redis::cmd("TYPE")
            .arg(key)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| DumpError::store("TYPE", Some(key), e))?;
        Ok(KeyType::parse(&reply))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, DumpError> {
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| DumpError::store("GET", Some(key), e))
    }

    async fn list_range(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, DumpError> {
        redis::cmd("LRANGE")
            .arg(key)
            .arg(start)
            .arg(stop)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| DumpError::store("LRANGE", Some(key), e))
    }

    async fn set_scan(
        &self,
        key: &str,
        cursor: Cursor,
        page_size: usize,
    ) -> Result<(Cursor, Vec<String>), DumpError> {
        let (next, members): (u64, Vec<String>) = redis::cmd("SSCAN")
            .arg(key)
            .arg(cursor.position())
            .arg("COUNT")
            .arg(page_size)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| DumpError::store("SSCAN", Some(key), e))?;
        Ok((Cursor::new(next), members))
    }

    async fn hash_scan(
        &self,
        key: &str,
        cursor: Cursor,
        page_size: usize,
    ) -> Result<(Cursor, Vec<(String, String)>), DumpError> {
        // HSCAN replies with a flat field, value, field, value... array
        let (next, flat): (u64, Vec<String>) = redis::cmd("HSCAN")
            .arg(key)
            .arg(cursor.position())
            .arg("COUNT")
            .arg(page_size)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| DumpError::store("HSCAN", Some(key), e))?;

        if flat.len() % 2 != 0 {
            return Err(DumpError::store(
                "HSCAN",
                Some(key),
                format!("odd number of elements in reply ({})", flat.len()),
            ));
        }

        let mut pairs = Vec::with_capacity(flat.len() / 2);
        let mut elements = flat.into_iter();
        while let (Some(field), Some(value)) = (elements.next(), elements.next()) {
            pairs.push((field, value));
        }
        Ok((Cursor::new(next), pairs))
    }

    async fn ttl(&self, key: &str) -> Result<i64, DumpError> {
        redis::cmd("TTL")
            .arg(key)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| DumpError::store("TTL", Some(key), e))
    }
}

/// Apply connection policy to a configured URL.
///
/// Managed Redis providers commonly serve TLS with certificates that do not
/// verify; `tls_insecure` turns verification off for `rediss://` URLs.
pub fn resolve_redis_url(redis_url: &str, tls_insecure: bool) -> String {
    if tls_insecure && redis_url.starts_with("rediss://") && !redis_url.contains('#') {
        format!("{}#insecure", redis_url)
    } else {
        redis_url.to_string()
    }
}

/// URL with any credentials masked, for logs and error messages.
pub fn redact_url(redis_url: &str) -> String {
    let Some((scheme, rest)) = redis_url.split_once("://") else {
        return redis_url.to_string();
    };
    match rest.rfind('@') {
        Some(at) => format!("{}://***@{}", scheme, &rest[at + 1..]),
        None => redis_url.to_string(),
    }
}
