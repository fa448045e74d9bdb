//! Dump runners that write files without a Redis server

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use manager::scheduler::DumpRunner;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Outcome of one scripted run
#[derive(Debug, Clone)]
pub enum DumpOutcome {
    /// Write `bytes` and report `keys`
    Success { keys: u64, bytes: Vec<u8> },
    /// Write `partial` and then fail
    Failure { partial: Vec<u8>, reason: String },
}

/// Plays back outcomes in order; once the script runs out every run succeeds
pub struct ScriptedDumpRunner {
    script: Mutex<VecDeque<DumpOutcome>>,
    outputs: Mutex<Vec<PathBuf>>,
}

impl ScriptedDumpRunner {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            outputs: Mutex::new(Vec::new()),
        }
    }

    pub fn then_succeed(self, keys: u64, bytes: &[u8]) -> Self {
        self.push(DumpOutcome::Success {
            keys,
            bytes: bytes.to_vec(),
        })
    }

    pub fn then_fail(self, partial: &[u8], reason: &str) -> Self {
        self.push(DumpOutcome::Failure {
            partial: partial.to_vec(),
            reason: reason.to_string(),
        })
    }

    fn push(self, outcome: DumpOutcome) -> Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    /// Every output path handed to the runner, in call order
    pub fn outputs(&self) -> Vec<PathBuf> {
        self.outputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl DumpRunner for ScriptedDumpRunner {
    async fn run(&self, output: &Path) -> Result<u64> {
        self.outputs.lock().unwrap().push(output.to_path_buf());
        let outcome = self.script.lock().unwrap().pop_front();

        match outcome {
            Some(DumpOutcome::Failure { partial, reason }) => {
                tokio::fs::write(output, partial).await?;
                Err(anyhow!(reason))
            }
            Some(DumpOutcome::Success { keys, bytes }) => {
                tokio::fs::write(output, bytes).await?;
                Ok(keys)
            }
            None => {
                tokio::fs::write(output, b"*1\r\n$4\r\nPING\r\n").await?;
                Ok(1)
            }
        }
    }
}

/// Always writes a partial file and fails
pub struct FailingDumpRunner;

#[async_trait]
impl DumpRunner for FailingDumpRunner {
    async fn run(&self, output: &Path) -> Result<u64> {
        tokio::fs::write(output, b"*3\r\n$3\r\nSET\r\n").await?;
        Err(anyhow!("connection reset by peer"))
    }
}
