use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, error, warn};

use crate::errors::DumpError;
use crate::store::StoreConnector;
use crate::types::{Command, Cursor, KeyType, KeyValue};

/// Read the full current value of `key`, whatever its type.
///
/// Sets and hashes are collected with SSCAN / HSCAN so that large collections
/// never come back in a single reply. A hash field seen on more than one page
/// keeps its last value.
pub async fn read_key_value(
    store: &dyn StoreConnector,
    key: &str,
    scan_batch_size: usize,
) -> Result<KeyValue, DumpError> {
    let key_type = store.key_type(key).await?;
    debug!("Key {:?} has type {:?}", key, key_type.as_str());

    let value = match key_type {
        KeyType::String => match store.get(key).await? {
            Some(value) => KeyValue::String(value),
            None => {
                debug!("Key {:?} vanished before it could be read", key);
                KeyValue::Missing
            }
        },
        KeyType::List => KeyValue::List(store.list_range(key, 0, -1).await?),
        KeyType::Set => {
            let mut members = BTreeSet::new();
            let mut cursor = Cursor::START;
            loop {
                let (next, page) = store.set_scan(key, cursor, scan_batch_size).await?;
                members.extend(page);
                cursor = next;
                if cursor.is_complete() {
                    break;
                }
            }
            KeyValue::Set(members)
        }
        KeyType::Hash => {
            let mut fields = BTreeMap::new();
            let mut cursor = Cursor::START;
            loop {
                let (next, page) = store.hash_scan(key, cursor, scan_batch_size).await?;
                fields.extend(page);
                cursor = next;
                if cursor.is_complete() {
                    break;
                }
            }
            KeyValue::Hash(fields)
        }
        KeyType::SortedSet => KeyValue::Unsupported(KeyType::SortedSet),
        KeyType::None => KeyValue::Missing,
        KeyType::Unknown(name) => KeyValue::Unsupported(KeyType::Unknown(name)),
    };

    Ok(value)
}

/// Write commands that rebuild `value` under `key`.
///
/// Collections are split so that no command carries more than
/// `cmd_batch_size` elements (field/value pairs for hashes); a trailing
/// partial batch still gets its own command. Unsupported types produce no
/// commands and are logged.
pub fn value_commands(key: &str, value: &KeyValue, cmd_batch_size: usize) -> Vec<Command> {
    let batch = cmd_batch_size.max(1);

    match value {
        KeyValue::String(value) => vec![Command::new("SET", key).arg(value.as_str())],
        KeyValue::List(items) => items
            .chunks(batch)
            .map(|chunk| Command::new("RPUSH", key).args(chunk.iter().map(String::as_str)))
            .collect(),
        KeyValue::Set(members) => {
            let members: Vec<&String> = members.iter().collect();
            members
                .chunks(batch)
                .map(|chunk| Command::new("SADD", key).args(chunk.iter().map(|m| m.as_str())))
                .collect()
        }
        KeyValue::Hash(fields) => {
            let pairs: Vec<(&String, &String)> = fields.iter().collect();
            pairs
                .chunks(batch)
                .map(|chunk| {
                    Command::new("HSET", key).args(
                        chunk
                            .iter()
                            .flat_map(|(field, value)| [field.as_str(), value.as_str()]),
                    )
                })
                .collect()
        }
        KeyValue::Unsupported(KeyType::SortedSet) => {
            warn!("Sorted sets are not supported, skipping key {:?}", key);
            Vec::new()
        }
        KeyValue::Unsupported(key_type) => {
            error!("Unexpected type {:?} for key {:?}, skipping", key_type.as_str(), key);
            Vec::new()
        }
        KeyValue::Missing => Vec::new(),
    }
}

pub async fn key_value_commands(
    store: &dyn StoreConnector,
    key: &str,
    scan_batch_size: usize,
    cmd_batch_size: usize,
) -> Result<Vec<Command>, DumpError> {
    let value = read_key_value(store, key, scan_batch_size).await?;
    Ok(value_commands(key, &value, cmd_batch_size))
}
