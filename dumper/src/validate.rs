//! Restore verification: compare a restored store against its source
//!
//! Keys are enumerated on the candidate (restored) store and each value is
//! read from both sides through the same [`StoreConnector`] interface. Sets
//! and hashes compare order-insensitively since they are materialized into
//! sorted collections.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::commands::read_key_value;
use crate::errors::DumpError;
use crate::store::StoreConnector;
use crate::types::{Cursor, DumpProgress, KeyValue};

#[derive(Debug, Clone, PartialEq)]
pub struct ValueDiff {
    pub key: String,
    pub candidate: KeyValue,
    pub reference: KeyValue,
}

pub async fn compare_stores(
    reference: &dyn StoreConnector,
    candidate: &dyn StoreConnector,
    keys_match: &str,
    scan_batch_size: usize,
    progress: Arc<DumpProgress>,
) -> Result<Vec<ValueDiff>, DumpError> {
    let key_count = candidate.key_count().await?;
    info!("Validating {} keys from the restored store", key_count);
    progress.start(key_count);

    let mut diffs = Vec::new();
    let mut cursor = Cursor::START;
    loop {
        let (next, keys) = candidate.scan(cursor, keys_match, scan_batch_size).await?;
        for key in &keys {
            let candidate_value = read_key_value(candidate, key, scan_batch_size).await?;
            let reference_value = read_key_value(reference, key, scan_batch_size).await?;
            if candidate_value != reference_value {
                diffs.push(ValueDiff {
                    key: key.clone(),
                    candidate: candidate_value,
                    reference: reference_value,
                });
            }
        }
        progress.advance(keys.len() as u64);

        cursor = next;
        if cursor.is_complete() {
            break;
        }
    }

    progress.finish();
    info!("Validation finished: {} mismatched keys", diffs.len());
    Ok(diffs)
}

pub fn format_diff_report(diffs: &[ValueDiff]) -> String {
    let mut report = String::new();
    for diff in diffs {
        let _ = writeln!(
            report,
            "\n{:?}\ncandidate = {:?}\nreference = {:?}\n",
            diff.key, diff.candidate, diff.reference
        );
    }
    report
}

pub async fn write_diff_report(diffs: &[ValueDiff], path: &Path) -> Result<(), DumpError> {
    tokio::fs::write(path, format_diff_report(diffs))
        .await
        .map_err(|e| DumpError::io(path.display(), e))
}
