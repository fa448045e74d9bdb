pub mod manager;
use anyhow::{anyhow, Result};
use dumper::DumpOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
pub use manager::ConfigManager;

use crate::constants::defaults;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source Redis URL; absent or "_env" means the REDIS_URL variable
    pub redis_url: Option<String>,
    /// Skip certificate verification for rediss:// URLs
    #[serde(default = "default_true")]
    pub tls_insecure: bool,
    #[serde(default = "default_backups_dir")]
    pub backups_dir: PathBuf,
    #[serde(default = "default_period_hours")]
    pub period_hours: f64,
    #[serde(default = "default_keep_last")]
    pub keep_last: usize,
    /// Wait for the next period boundary before the first backup
    #[serde(default = "default_true")]
    pub first_wait: bool,
    #[serde(default)]
    pub alarm_webhook_url: String,
    // Status API is only served when a port is configured
    pub status_host: Option<String>,
    pub status_port: Option<u16>,
    #[serde(default)]
    pub dump: DumpOptions,
}

fn default_true() -> bool {
    true
}

fn default_backups_dir() -> PathBuf {
    PathBuf::from(defaults::BACKUPS_DIR)
}

fn default_period_hours() -> f64 {
    defaults::PERIOD_HOURS
}

fn default_keep_last() -> usize {
    defaults::KEEP_LAST
}

impl Config {
    pub fn period(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.period_hours * 3600.0).map_err(|e| {
            anyhow!(
                "Invalid value for 'period_hours': {} is out of range: {}",
                self.period_hours,
                e
            )
        })
    }

    /// Resolved source URL; only valid after [`ConfigManager`] has loaded the config
    pub fn redis_url(&self) -> Result<&str> {
        self.redis_url
            .as_deref()
            .filter(|url| *url != defaults::REDIS_URL_FROM_ENV)
            .ok_or_else(|| anyhow!("Redis URL has not been resolved"))
    }

    pub fn status_bind_address(&self) -> Option<String> {
        self.status_port.map(|port| {
            format!(
                "{}:{}",
                self.status_host.as_deref().unwrap_or("0.0.0.0"),
                port
            )
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.period_hours.is_finite() && self.period_hours > 0.0) {
            return Err(anyhow!(
                "Invalid value for 'period_hours': must be positive, got {}",
                self.period_hours
            ));
        }
        self.period()?;
        if self.keep_last == 0 {
            return Err(anyhow!("Invalid value for 'keep_last': must be at least 1"));
        }
        self.dump.validate()?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: None,
            tls_insecure: true,
            backups_dir: default_backups_dir(),
            period_hours: default_period_hours(),
            keep_last: default_keep_last(),
            first_wait: true,
            alarm_webhook_url: String::new(),
            status_host: None,
            status_port: None,
            dump: DumpOptions::default(),
        }
    }
}
