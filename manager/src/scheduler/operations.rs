use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, Utc};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use super::{next_backup_time, DumpRunner};
use crate::backup::{backup_file_name, prune_backups, BackupRun, MetadataLedger};
use crate::config::Config;
use crate::services::{AlertService, AlertSeverity, AlertType};

pub struct BackupScheduler {
    config: Arc<Config>,
    runner: Arc<dyn DumpRunner>,
    ledger: MetadataLedger,
    alert_service: Arc<AlertService>,
    current_dump: Arc<RwLock<Option<PathBuf>>>,
}

impl BackupScheduler {
    pub fn new(
        config: Arc<Config>,
        runner: Arc<dyn DumpRunner>,
        alert_service: Arc<AlertService>,
    ) -> Self {
        let ledger = MetadataLedger::in_dir(&config.backups_dir);
        Self {
            config,
            runner,
            ledger,
            alert_service,
            current_dump: Arc::new(RwLock::new(None)),
        }
    }

    /// Path of the dump being written right now, if any
    pub fn current_dump(&self) -> Arc<RwLock<Option<PathBuf>>> {
        self.current_dump.clone()
    }

    pub fn ledger(&self) -> &MetadataLedger {
        &self.ledger
    }

    /// Run backup cycles until the task is dropped. Returns only when the
    /// configured period is unusable.
    pub async fn run(&self) -> Result<()> {
        let period = self.config.period()?.as_secs_f64();
        info!(
            "Starting periodic backups every {} sec into {}",
            period,
            self.config.backups_dir.display()
        );

        let mut has_run = false;
        loop {
            if has_run || self.config.first_wait {
                self.wait_for_next_period(period).await;
            }

            if let Err(e) = self.execute_backup_cycle().await {
                error!("Error creating backup: {:#}", e);
                self.alert_service
                    .send_alert(
                        AlertType::CycleError,
                        AlertSeverity::Critical,
                        format!("Backup cycle failed: {}", e),
                        None,
                    )
                    .await;
            }

            has_run = true;
        }
    }

    async fn wait_for_next_period(&self, period: f64) {
        let now = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
        let next = next_backup_time(now, period);
        let wait = (next - now).max(0.0);

        let next_local = DateTime::<Utc>::from_timestamp_micros((next * 1_000_000.0) as i64)
            .map(|t| t.with_timezone(&Local).to_rfc3339())
            .unwrap_or_else(|| format!("{:.0}", next));
        info!("Next backup at {}, sleeping for {:.2} sec", next_local, wait);

        tokio::time::sleep(Duration::try_from_secs_f64(wait).unwrap_or(Duration::MAX)).await;
    }

    /// One dump, record and prune pass.
    ///
    /// A failed dump is handled here and yields `Ok(None)`; errors returned
    /// come from recording or pruning after a successful dump.
    #[instrument(skip(self))]
    pub async fn execute_backup_cycle(&self) -> Result<Option<BackupRun>> {
        let started_at = Utc::now();
        let filename = backup_file_name(started_at.with_timezone(&Local));
        let dump_path = self.config.backups_dir.join(&filename);

        info!("Starting backup to {}", dump_path.display());
        *self.current_dump.write().await = Some(dump_path.clone());

        let timer = Instant::now();
        let result = self.runner.run(&dump_path).await;
        let dump_time = timer.elapsed().as_secs_f64();

        *self.current_dump.write().await = None;

        let total_keys = match result {
            Ok(total_keys) => total_keys,
            Err(e) => {
                error!(
                    "Backup {} failed after {:.2} sec: {:#}",
                    filename, dump_time, e
                );
                remove_partial_dump(&dump_path).await;
                self.alert_service
                    .send_alert(
                        AlertType::BackupFailed,
                        AlertSeverity::Critical,
                        format!("Redis backup {} failed: {}", filename, e),
                        Some(json!({ "filename": filename, "dump_time": dump_time })),
                    )
                    .await;
                return Ok(None);
            }
        };

        let size_bytes = tokio::fs::metadata(&dump_path)
            .await
            .map_err(|e| anyhow!("Failed to stat dump {}: {}", dump_path.display(), e))?
            .len();

        let run = BackupRun::new(started_at, filename, dump_time, total_keys, size_bytes);
        info!(
            "Backup {} completed: {} keys, {:.2} MB in {:.2} sec",
            run.filename, run.total_keys, run.dump_size_mb, run.dump_time
        );

        self.ledger.append(run.clone()).await?;

        let deleted = prune_backups(&self.config.backups_dir, self.config.keep_last).await?;
        if !deleted.is_empty() {
            info!("Pruned {} outdated backups", deleted.len());
        }

        Ok(Some(run))
    }

    /// Delete the dump being written, if any. Used on shutdown, after the
    /// cycle future has been dropped.
    pub async fn discard_in_progress(&self) {
        if let Some(path) = self.current_dump.write().await.take() {
            warn!("Discarding unfinished backup {}", path.display());
            remove_partial_dump(&path).await;
        }
    }
}

async fn remove_partial_dump(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => info!("Removed partial dump {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial dump {}: {}", path.display(), e),
    }
}
