//! In-memory keyspace standing in for a Redis server

use async_trait::async_trait;
use dumper::{Cursor, DumpError, KeyType, KeyValue, StoreConnector};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct MemoryStore {
    keys: Mutex<BTreeMap<String, KeyValue>>,
    ttls: Mutex<HashMap<String, i64>>,
    hash_pages: Mutex<HashMap<String, Vec<Vec<(String, String)>>>>,
    vanished: Mutex<HashSet<String>>,
    failures: Mutex<Vec<(String, Option<String>)>>,
    reported_key_count: Mutex<Option<u64>>,
    selected_db: Mutex<Option<u32>>,
    type_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    scan_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_string(self, key: &str, value: &str) -> Self {
        self.insert(key, KeyValue::String(value.to_string()))
    }

    pub fn with_list(self, key: &str, items: &[&str]) -> Self {
        self.insert(key, KeyValue::List(to_strings(items)))
    }

    pub fn with_set(self, key: &str, members: &[&str]) -> Self {
        self.insert(key, KeyValue::Set(to_strings(members).into_iter().collect()))
    }

    pub fn with_hash(self, key: &str, fields: &[(&str, &str)]) -> Self {
        self.insert(
            key,
            KeyValue::Hash(
                fields
                    .iter()
                    .map(|(f, v)| (f.to_string(), v.to_string()))
                    .collect(),
            ),
        )
    }

    pub fn with_sorted_set(self, key: &str) -> Self {
        self.insert(key, KeyValue::Unsupported(KeyType::SortedSet))
    }

    pub fn with_unknown_type(self, key: &str, type_name: &str) -> Self {
        self.insert(key, KeyValue::Unsupported(KeyType::Unknown(type_name.to_string())))
    }

    /// Hash whose HSCAN replies are exactly these pages, in order
    pub fn with_hash_pages(self, key: &str, pages: Vec<Vec<(&str, &str)>>) -> Self {
        let pages = pages
            .into_iter()
            .map(|page| {
                page.into_iter()
                    .map(|(f, v)| (f.to_string(), v.to_string()))
                    .collect()
            })
            .collect();
        self.hash_pages.lock().unwrap().insert(key.to_string(), pages);
        self.keys
            .lock()
            .unwrap()
            .insert(key.to_string(), KeyValue::Hash(BTreeMap::new()));
        self
    }

    /// Key that reports type `string` but is gone by the time it is read
    pub fn with_vanishing_key(self, key: &str) -> Self {
        self.vanished.lock().unwrap().insert(key.to_string());
        self.insert(key, KeyValue::Missing)
    }

    pub fn with_ttl(self, key: &str, ttl: i64) -> Self {
        self.ttls.lock().unwrap().insert(key.to_string(), ttl);
        self
    }

    /// Make `operation` (e.g. "TYPE") fail, for one key or for every call
    pub fn failing_on(self, operation: &str, key: Option<&str>) -> Self {
        self.failures
            .lock()
            .unwrap()
            .push((operation.to_string(), key.map(str::to_string)));
        self
    }

    pub fn reporting_key_count(self, count: u64) -> Self {
        *self.reported_key_count.lock().unwrap() = Some(count);
        self
    }

    /// Slow down TYPE so that concurrent batches overlap
    pub fn with_type_delay(mut self, delay: Duration) -> Self {
        self.type_delay = delay;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn scan_calls(&self) -> usize {
        self.scan_calls.load(Ordering::SeqCst)
    }

    pub fn selected_db(&self) -> Option<u32> {
        *self.selected_db.lock().unwrap()
    }

    pub fn value_of(&self, key: &str) -> Option<KeyValue> {
        self.keys.lock().unwrap().get(key).cloned()
    }

    fn insert(self, key: &str, value: KeyValue) -> Self {
        self.keys.lock().unwrap().insert(key.to_string(), value);
        self
    }

    fn check_failure(&self, operation: &str, key: Option<&str>) -> Result<(), DumpError> {
        let failures = self.failures.lock().unwrap();
        let hit = failures
            .iter()
            .any(|(op, target)| op == operation && (target.is_none() || target.as_deref() == key));
        if hit {
            Err(DumpError::store(operation, key, "injected failure"))
        } else {
            Ok(())
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn page<T: Clone>(items: &[T], cursor: Cursor, page_size: usize) -> (Cursor, Vec<T>) {
    let start = (cursor.position() as usize).min(items.len());
    let end = (start + page_size.max(1)).min(items.len());
    let next = if end >= items.len() { 0 } else { end as u64 };
    (Cursor::new(next), items[start..end].to_vec())
}

/// Glob match supporting `*` and `?`, which is all the tests need
pub fn glob_match(pattern: &str, text: &str) -> bool {
    fn matches(p: &[char], t: &[char]) -> bool {
        match (p.first(), t.first()) {
            (None, None) => true,
            (Some('*'), _) => matches(&p[1..], t) || (!t.is_empty() && matches(p, &t[1..])),
            (Some('?'), Some(_)) => matches(&p[1..], &t[1..]),
            (Some(a), Some(b)) if a == b => matches(&p[1..], &t[1..]),
            _ => false,
        }
    }
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    matches(&p, &t)
}

#[async_trait]
impl StoreConnector for MemoryStore {
    async fn ping(&self) -> Result<(), DumpError> {
        self.check_failure("PING", None)
    }

    async fn select(&self, db: u32) -> Result<(), DumpError> {
        self.check_failure("SELECT", None)?;
        *self.selected_db.lock().unwrap() = Some(db);
        Ok(())
    }

    async fn key_count(&self) -> Result<u64, DumpError> {
        self.check_failure("DBSIZE", None)?;
        if let Some(count) = *self.reported_key_count.lock().unwrap() {
            return Ok(count);
        }
        Ok(self.keys.lock().unwrap().len() as u64)
    }

    async fn scan(
        &self,
        cursor: Cursor,
        pattern: &str,
        page_size: usize,
    ) -> Result<(Cursor, Vec<String>), DumpError> {
        self.check_failure("SCAN", None)?;
        self.scan_calls.fetch_add(1, Ordering::SeqCst);
        let all: Vec<String> = self.keys.lock().unwrap().keys().cloned().collect();
        // Like Redis, COUNT bounds the keys examined and MATCH filters afterwards
        let (next, examined) = page(&all, cursor, page_size);
        let matching = examined
            .into_iter()
            .filter(|key| glob_match(pattern, key))
            .collect();
        Ok((next, matching))
    }

    async fn key_type(&self, key: &str) -> Result<KeyType, DumpError> {
        self.check_failure("TYPE", Some(key))?;

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.type_delay.is_zero() {
            tokio::time::sleep(self.type_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.vanished.lock().unwrap().contains(key) {
            return Ok(KeyType::String);
        }
        let key_type = match self.keys.lock().unwrap().get(key) {
            Some(KeyValue::String(_)) => KeyType::String,
            Some(KeyValue::List(_)) => KeyType::List,
            Some(KeyValue::Set(_)) => KeyType::Set,
            Some(KeyValue::Hash(_)) => KeyType::Hash,
            Some(KeyValue::Unsupported(kind)) => kind.clone(),
            Some(KeyValue::Missing) | None => KeyType::None,
        };
        Ok(key_type)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, DumpError> {
        self.check_failure("GET", Some(key))?;
        match self.keys.lock().unwrap().get(key) {
            Some(KeyValue::String(value)) => Ok(Some(value.clone())),
            _ => Ok(None),
        }
    }

    async fn list_range(&self, key: &str, _start: i64, _stop: i64) -> Result<Vec<String>, DumpError> {
        self.check_failure("LRANGE", Some(key))?;
        match self.keys.lock().unwrap().get(key) {
            Some(KeyValue::List(items)) => Ok(items.clone()),
            _ => Ok(Vec::new()),
        }
    }

    async fn set_scan(
        &self,
        key: &str,
        cursor: Cursor,
        page_size: usize,
    ) -> Result<(Cursor, Vec<String>), DumpError> {
        self.check_failure("SSCAN", Some(key))?;
        let members: Vec<String> = match self.keys.lock().unwrap().get(key) {
            Some(KeyValue::Set(members)) => members.iter().cloned().collect(),
            _ => Vec::new(),
        };
        Ok(page(&members, cursor, page_size))
    }

    async fn hash_scan(
        &self,
        key: &str,
        cursor: Cursor,
        page_size: usize,
    ) -> Result<(Cursor, Vec<(String, String)>), DumpError> {
        self.check_failure("HSCAN", Some(key))?;

        if let Some(pages) = self.hash_pages.lock().unwrap().get(key) {
            let index = cursor.position() as usize;
            let next = if index + 1 >= pages.len() { 0 } else { index as u64 + 1 };
            let reply = pages.get(index).cloned().unwrap_or_default();
            return Ok((Cursor::new(next), reply));
        }

        let pairs: Vec<(String, String)> = match self.keys.lock().unwrap().get(key) {
            Some(KeyValue::Hash(fields)) => fields
                .iter()
                .map(|(f, v)| (f.clone(), v.clone()))
                .collect(),
            _ => Vec::new(),
        };
        Ok(page(&pairs, cursor, page_size))
    }

    async fn ttl(&self, key: &str) -> Result<i64, DumpError> {
        self.check_failure("TTL", Some(key))?;
        Ok(self.ttls.lock().unwrap().get(key).copied().unwrap_or(-1))
    }
}
