use super::Config;
use anyhow::{anyhow, Result};
use dumper::store::{redact_url, resolve_redis_url};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

use crate::constants::{defaults, env};

pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    pub async fn new(config_dir: String) -> Result<Self> {
        let config = Self::load_configuration(&config_dir).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    async fn load_configuration(config_dir: &str) -> Result<Config> {
        let main_config_path = Path::new(config_dir).join("main.toml");

        let mut config: Config = if fs::try_exists(&main_config_path).await.unwrap_or(false) {
            let content = fs::read_to_string(&main_config_path).await.map_err(|e| {
                anyhow!(
                    "Failed to read main config {}: {}",
                    main_config_path.display(),
                    e
                )
            })?;
            toml::from_str(&content).map_err(|e| anyhow!("Failed to parse main config: {}", e))?
        } else {
            debug!(
                "No config at {}, using defaults",
                main_config_path.display()
            );
            Config::default()
        };

        Self::resolve_environment(&mut config)?;
        config.validate()?;

        info!(
            "Configuration loaded: source {}, backups in {}, every {}h, keeping last {}",
            redact_url(config.redis_url()?),
            config.backups_dir.display(),
            config.period_hours,
            config.keep_last
        );

        Ok(config)
    }

    /// Fill in values that come from the environment rather than the file
    pub fn resolve_environment(config: &mut Config) -> Result<()> {
        let configured = config
            .redis_url
            .clone()
            .filter(|url| url != defaults::REDIS_URL_FROM_ENV);

        let redis_url = match configured {
            Some(url) => url,
            None => std::env::var(env::REDIS_URL)
                .map_err(|_| anyhow!("{} env var is not set", env::REDIS_URL))?,
        };
        config.redis_url = Some(resolve_redis_url(&redis_url, config.tls_insecure));

        if config.alarm_webhook_url.is_empty() {
            if let Ok(webhook) = std::env::var(env::ALARM_WEBHOOK_URL) {
                config.alarm_webhook_url = webhook;
            }
        }

        Ok(())
    }
}
