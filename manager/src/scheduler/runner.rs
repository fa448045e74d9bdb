use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dumper::{run_dump, DumpOptions, DumpProgress};
use std::path::Path;
use std::sync::Arc;

/// Produces one dump file per call
#[async_trait]
pub trait DumpRunner: Send + Sync {
    /// Dump the keyspace to `output` and return the key count the store
    /// reported when the run started
    async fn run(&self, output: &Path) -> Result<u64>;
}

pub struct RedisDumpRunner {
    redis_url: String,
    options: DumpOptions,
    progress: Arc<DumpProgress>,
}

impl RedisDumpRunner {
    pub fn new(redis_url: String, options: DumpOptions, progress: Arc<DumpProgress>) -> Self {
        Self {
            redis_url,
            options,
            progress,
        }
    }
}

#[async_trait]
impl DumpRunner for RedisDumpRunner {
    async fn run(&self, output: &Path) -> Result<u64> {
        run_dump(&self.redis_url, output, &self.options, self.progress.clone())
            .await
            .map_err(|e| anyhow!("Dump to {} failed: {}", output.display(), e))
    }
}
