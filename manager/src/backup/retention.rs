use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

use super::list_backup_files;

/// Delete every dump file beyond the `keep_last` most recently created.
///
/// Returns the names of the deleted files. A file that cannot be deleted is
/// logged and skipped; the next cycle will try again.
pub async fn prune_backups(backups_dir: &Path, keep_last: usize) -> Result<Vec<String>> {
    let backups = list_backup_files(backups_dir).await?;

    if backups.len() <= keep_last {
        info!(
            "No outdated backups to delete (have {}, keeping {})",
            backups.len(),
            keep_last
        );
        return Ok(Vec::new());
    }

    let mut deleted = Vec::new();
    for outdated in &backups[keep_last..] {
        info!("Deleting outdated {}", outdated.path.display());
        match tokio::fs::remove_file(&outdated.path).await {
            Ok(()) => deleted.push(outdated.filename.clone()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete {}: {}", outdated.path.display(), e),
        }
    }

    Ok(deleted)
}
