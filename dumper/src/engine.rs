//! Full-keyspace scan and dump
//!
//! The engine walks the keyspace with SCAN and hands every page of keys to a
//! dump task. At most `workers` tasks run at once: each task holds a semaphore
//! permit for its whole lifetime, and dispatching the next page waits for a
//! free permit. Once the scan cursor completes, all in-flight tasks are
//! drained before the output is flushed.
//!
//! # Ordering
//!
//! Within a batch, keys are written in scan order, and each key's value
//! commands precede its `EXPIREAT`. Batches running concurrently interleave
//! freely with each other. A key's encoded commands are written with a single
//! `write_all` under the output lock, so frames are never split.
//!
//! # Consistency
//!
//! The dump is not a point-in-time snapshot: keys changed during the run may
//! be captured before or after the change, and keys created or deleted
//! mid-scan may be missed.

use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument};

use crate::commands::key_commands;
use crate::errors::DumpError;
use crate::resp::encode_commands;
use crate::store::{redact_url, RedisStore, StoreConnector};
use crate::types::{Cursor, DumpOptions, DumpProgress};

type SharedWriter = Arc<Mutex<BufWriter<File>>>;

pub struct ScanDumpEngine {
    store: Arc<dyn StoreConnector>,
    options: DumpOptions,
    progress: Arc<DumpProgress>,
}

/// Everything a dump task needs, cloned once per dispatched batch
#[derive(Clone)]
struct BatchContext {
    store: Arc<dyn StoreConnector>,
    writer: SharedWriter,
    progress: Arc<DumpProgress>,
    output: Arc<str>,
    scan_batch_size: usize,
    cmd_batch_size: usize,
}

impl ScanDumpEngine {
    pub fn new(store: Arc<dyn StoreConnector>, options: DumpOptions) -> Self {
        Self {
            store,
            options,
            progress: Arc::new(DumpProgress::new()),
        }
    }

    pub fn with_progress(mut self, progress: Arc<DumpProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn progress(&self) -> Arc<DumpProgress> {
        self.progress.clone()
    }

    /// Dump every key matching the configured pattern into `output`.
    ///
    /// Returns the key count reported by the store when the run started. The
    /// number of keys actually written can differ if the keyspace changes
    /// during the run. On error the output file is left as-is; it is not a
    /// valid backup and the caller is expected to discard it.
    #[instrument(skip_all, fields(output = %output.display(), db = self.options.db))]
    pub async fn dump_to_file(&self, output: &Path) -> Result<u64, DumpError> {
        self.options.validate()?;

        self.store.select(self.options.db).await?;
        info!("Redis DB #{} selected", self.options.db);

        let key_count = self.store.key_count().await?;
        info!("Total keys in the database: {}", key_count);

        self.progress.start(key_count);
        let result = self.scan_and_dump(output).await;
        self.progress.finish();
        result?;

        let written = self.progress.snapshot().keys_processed;
        info!("Done! Dumped {} keys to {}", written, output.display());
        Ok(key_count)
    }

    async fn scan_and_dump(&self, output: &Path) -> Result<(), DumpError> {
        let file = File::create(output)
            .await
            .map_err(|e| DumpError::io(output.display(), e))?;

        let context = BatchContext {
            store: self.store.clone(),
            writer: Arc::new(Mutex::new(BufWriter::new(file))),
            progress: self.progress.clone(),
            output: Arc::from(output.display().to_string()),
            scan_batch_size: self.options.scan_batch_size,
            cmd_batch_size: self.options.cmd_batch_size,
        };

        let permits = Arc::new(Semaphore::new(self.options.workers));
        let mut tasks: JoinSet<Result<(), DumpError>> = JoinSet::new();
        let mut cursor = Cursor::START;
        let mut dispatched = 0u64;

        loop {
            let (next, keys) = self
                .store
                .scan(cursor, &self.options.keys_match, self.options.scan_batch_size)
                .await?;
            cursor = next;

            // Fail the run as soon as any finished batch reports an error
            while let Some(joined) = tasks.try_join_next() {
                joined??;
            }

            if !keys.is_empty() {
                let permit = permits
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| DumpError::Task {
                        reason: e.to_string(),
                    })?;
                let context = context.clone();
                tasks.spawn(async move {
                    let _permit = permit;
                    dump_key_batch(context, keys).await
                });
                dispatched += 1;
            }

            if cursor.is_complete() {
                break;
            }
        }

        debug!(
            "Keyspace scan complete after {} batches, waiting for {} in-flight",
            dispatched,
            tasks.len()
        );
        while let Some(joined) = tasks.join_next().await {
            joined??;
        }

        let mut writer = context.writer.lock().await;
        writer
            .flush()
            .await
            .map_err(|e| DumpError::io(&context.output, e))?;
        writer
            .get_mut()
            .sync_all()
            .await
            .map_err(|e| DumpError::io(&context.output, e))?;
        Ok(())
    }
}

async fn dump_key_batch(context: BatchContext, keys: Vec<String>) -> Result<(), DumpError> {
    for key in &keys {
        let commands = key_commands(
            context.store.as_ref(),
            key,
            context.scan_batch_size,
            context.cmd_batch_size,
        )
        .await?;
        if commands.is_empty() {
            continue;
        }

        let frames = encode_commands(&commands);
        context
            .writer
            .lock()
            .await
            .write_all(&frames)
            .await
            .map_err(|e| DumpError::io(&context.output, e))?;
    }

    context.progress.advance(keys.len() as u64);
    let progress = context.progress.snapshot();
    debug!(
        "Dumped {}/{} keys",
        progress.keys_processed, progress.keys_total
    );
    Ok(())
}

/// Connect to `redis_url` and dump its keyspace into `output`.
pub async fn run_dump(
    redis_url: &str,
    output: &Path,
    options: &DumpOptions,
    progress: Arc<DumpProgress>,
) -> Result<u64, DumpError> {
    info!("Connecting to {}", redact_url(redis_url));
    let store = RedisStore::connect(redis_url).await?;
    store.ping().await?;

    ScanDumpEngine::new(Arc::new(store), options.clone())
        .with_progress(progress)
        .dump_to_file(output)
        .await
}
