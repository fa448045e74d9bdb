use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::BackupRun;
use crate::constants::files;

/// The `metadata.json` ledger of completed runs.
///
/// Appending reads the whole file, pushes one record and rewrites it, so the
/// ledger assumes a single writer.
pub struct MetadataLedger {
    path: PathBuf,
}

impl MetadataLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The ledger kept alongside the dumps in `backups_dir`
    pub fn in_dir(backups_dir: &Path) -> Self {
        Self::new(backups_dir.join(files::METADATA_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All recorded runs; a missing file is an empty ledger
    pub async fn load(&self) -> Result<Vec<BackupRun>> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| anyhow!("Failed to read ledger {}: {}", self.path.display(), e))?;
        serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse ledger {}: {}", self.path.display(), e))
    }

    pub async fn append(&self, run: BackupRun) -> Result<()> {
        let mut runs = self.load().await?;

        if let Some(last) = runs.last() {
            if last.timestamp > run.timestamp {
                warn!(
                    "Ledger entry {} is older than the last recorded run {}",
                    run.filename, last.filename
                );
            }
        }
        runs.push(run);

        let content = serde_json::to_string_pretty(&runs)
            .map_err(|e| anyhow!("Failed to serialize ledger: {}", e))?;

        // Replace via rename so a crash never leaves a truncated ledger
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .await
            .map_err(|e| anyhow!("Failed to write {}: {}", tmp_path.display(), e))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| anyhow!("Failed to replace ledger {}: {}", self.path.display(), e))?;

        debug!("Ledger now holds {} runs", runs.len());
        Ok(())
    }
}
