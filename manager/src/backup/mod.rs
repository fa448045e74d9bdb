//! Backup directory management
//!
//! Layout of the backups directory:
//!
//! ```text
//! backups/
//! ├── metadata.json                          # ledger of completed runs
//! ├── redis-backup-2025-01-15T12:00:00.resp  # one RESP command log per run
//! └── redis-backup-2025-01-15T13:00:00.resp
//! ```
//!
//! - **Ledger**: append-only JSON array of [`BackupRun`] records, one per
//!   successful run, in ascending timestamp order
//! - **Retention**: only the `keep_last` most recently created dump files are
//!   kept; ordering uses filesystem creation time, not the timestamp in the
//!   file name, so a copied-in file counts as new

pub mod ledger;
pub mod retention;

pub use ledger::MetadataLedger;
pub use retention::prune_backups;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::warn;

use crate::constants::files;

/// One completed backup run, as recorded in `metadata.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackupRun {
    /// Run start, seconds since the Unix epoch
    pub timestamp: f64,
    pub filename: String,
    /// Wall-clock duration of the dump in seconds
    pub dump_time: f64,
    /// Key count reported by the store when the run started
    pub total_keys: u64,
    pub dump_size_mb: f64,
}

impl BackupRun {
    pub fn new(
        started_at: DateTime<Utc>,
        filename: String,
        dump_time_seconds: f64,
        total_keys: u64,
        size_bytes: u64,
    ) -> Self {
        Self {
            timestamp: started_at.timestamp_millis() as f64 / 1000.0,
            filename,
            dump_time: dump_time_seconds,
            total_keys,
            dump_size_mb: size_bytes as f64 / (1024.0 * 1024.0),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupFile {
    pub filename: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// `redis-backup-<local time, second precision>.resp`
pub fn backup_file_name(started_at: DateTime<Local>) -> String {
    format!(
        "{}-{}.{}",
        files::BACKUP_FILE_PREFIX,
        started_at.format(files::BACKUP_TIMESTAMP_FORMAT),
        files::BACKUP_FILE_EXTENSION
    )
}

/// All dump files in `backups_dir`, newest first by creation time
pub async fn list_backup_files(backups_dir: &Path) -> Result<Vec<BackupFile>> {
    let pattern = format!(
        "{}/{}*",
        glob::Pattern::escape(&backups_dir.to_string_lossy()),
        files::BACKUP_FILE_PREFIX
    );

    let mut backups = Vec::new();
    for entry in glob::glob(&pattern).map_err(|e| anyhow!("Glob pattern error: {}", e))? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable backup entry: {}", e);
                continue;
            }
        };

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => continue,
            // Deleted between listing and stat
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(anyhow!("Failed to stat {}: {}", path.display(), e)),
        };

        // Not every filesystem records birth time
        let created: SystemTime = metadata
            .created()
            .or_else(|_| metadata.modified())
            .map_err(|e| anyhow!("No timestamps for {}: {}", path.display(), e))?;

        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow!("Invalid filename: {}", path.display()))?
            .to_string();

        backups.push(BackupFile {
            filename,
            size_bytes: metadata.len(),
            created_at: DateTime::<Utc>::from(created),
            path,
        });
    }

    backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(backups)
}
