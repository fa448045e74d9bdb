use chrono::Utc;

use crate::errors::DumpError;
use crate::store::StoreConnector;
use crate::types::Command;

/// `EXPIREAT key <now + ttl>` when the key has a positive remaining TTL.
///
/// The absolute deadline is computed from the wall clock at TTL query time,
/// so it drifts by however long passed since the value itself was read.
pub async fn ttl_command(store: &dyn StoreConnector, key: &str) -> Result<Option<Command>, DumpError> {
    let ttl = store.ttl(key).await?;
    if ttl <= 0 {
        return Ok(None);
    }

    let expire_at = Utc::now().timestamp() + ttl;
    Ok(Some(
        Command::new("EXPIREAT", key).arg(expire_at.to_string()),
    ))
}
