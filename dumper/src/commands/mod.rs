//! Translation of live key state into replayable write commands
//!
//! - [`value`]: one key's current value → `SET` / `RPUSH` / `SADD` / `HSET`
//! - [`ttl`]: remaining time to live → absolute `EXPIREAT`
//!
//! For a given key the value commands always precede its expiry command,
//! otherwise replaying would expire the key before it is rebuilt.

pub mod ttl;
pub mod value;

pub use ttl::ttl_command;
pub use value::{key_value_commands, read_key_value, value_commands};

use crate::errors::DumpError;
use crate::store::StoreConnector;
use crate::types::Command;

/// All commands needed to recreate `key`: value commands, then the expiry.
pub async fn key_commands(
    store: &dyn StoreConnector,
    key: &str,
    scan_batch_size: usize,
    cmd_batch_size: usize,
) -> Result<Vec<Command>, DumpError> {
    let mut commands = key_value_commands(store, key, scan_batch_size, cmd_batch_size).await?;
    if let Some(expire) = ttl_command(store, key).await? {
        commands.push(expire);
    }
    Ok(commands)
}
