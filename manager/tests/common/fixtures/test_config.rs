//! Test configuration builder for creating configs programmatically

use manager::config::Config;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Writes `config/main.toml` into a temporary directory that also holds the
/// backups directory
pub struct TestConfigBuilder {
    temp_dir: TempDir,
    lines: Vec<String>,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
            lines: Vec::new(),
        }
    }

    /// Add a raw `key = value` line to main.toml
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.lines.push(format!("{} = {}", key, value));
        self
    }

    /// Start a `[name]` table; later lines belong to it
    pub fn section(mut self, name: &str) -> Self {
        self.lines.push(format!("[{}]", name));
        self
    }

    pub fn build(self) -> TestConfig {
        let config_dir = self.temp_dir.path().join("config");
        let backups_dir = self.temp_dir.path().join("backups");
        fs::create_dir_all(&config_dir).expect("Failed to create config dir");
        fs::create_dir_all(&backups_dir).expect("Failed to create backups dir");

        let mut content = format!("backups_dir = {:?}\n", backups_dir.to_string_lossy());
        for line in &self.lines {
            content.push_str(line);
            content.push('\n');
        }
        fs::write(config_dir.join("main.toml"), content).expect("Failed to write main.toml");

        TestConfig {
            _temp_dir: self.temp_dir,
            config_dir,
            backups_dir,
        }
    }
}

pub struct TestConfig {
    _temp_dir: TempDir,
    pub config_dir: PathBuf,
    pub backups_dir: PathBuf,
}

impl TestConfig {
    pub fn config_dir_string(&self) -> String {
        self.config_dir.to_string_lossy().into_owned()
    }
}

/// A resolved config pointing at `backups_dir`, for tests that skip loading
pub fn scheduler_config(backups_dir: &Path, keep_last: usize) -> Arc<Config> {
    Arc::new(Config {
        redis_url: Some("redis://localhost:6379".to_string()),
        backups_dir: backups_dir.to_path_buf(),
        keep_last,
        first_wait: false,
        ..Config::default()
    })
}
