use anyhow::{anyhow, Result};
use clap::Parser;
use dumper::{DumpProgress, RedisStore, StoreConnector};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use manager::backup::MetadataLedger;
use manager::config::ConfigManager;
use manager::scheduler::{BackupScheduler, RedisDumpRunner};
use manager::services::AlertService;
use manager::web::{start_status_server, AppState};

/// Periodic Redis backups with retention
#[derive(Parser, Debug)]
#[command(name = "manager", version)]
struct Cli {
    /// Directory holding main.toml
    #[arg(long, default_value = "config")]
    config_dir: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::from_default_env()
        .add_directive("manager=info".parse()?)
        .add_directive("dumper=info".parse()?)
        .add_directive("tower_http=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("redis=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting Redis periodic backup manager");

    let config_manager = ConfigManager::new(cli.config_dir).await?;
    let config = config_manager.get_current_config();

    tokio::fs::create_dir_all(&config.backups_dir)
        .await
        .map_err(|e| {
            anyhow!(
                "Failed to create backups dir {}: {}",
                config.backups_dir.display(),
                e
            )
        })?;

    // Refuse to start against an unreachable source
    let redis_url = config.redis_url()?.to_string();
    RedisStore::connect(&redis_url).await?.ping().await?;

    let alert_service = Arc::new(AlertService::new(config.alarm_webhook_url.clone())?);
    if alert_service.is_enabled() {
        info!("Alert service enabled");
    } else {
        warn!("Alert system not configured - set alarm_webhook_url or ALARM_WEBHOOK_URL");
    }

    let progress = Arc::new(DumpProgress::new());
    let runner = Arc::new(RedisDumpRunner::new(
        redis_url,
        config.dump.clone(),
        progress.clone(),
    ));
    let scheduler = Arc::new(BackupScheduler::new(
        config.clone(),
        runner,
        alert_service.clone(),
    ));

    let status_server = {
        let bind_address = config.status_bind_address();
        let state = AppState {
            config: config.clone(),
            progress: progress.clone(),
            ledger: Arc::new(MetadataLedger::in_dir(&config.backups_dir)),
            current_dump: scheduler.current_dump(),
        };
        async move {
            match bind_address {
                Some(addr) => {
                    if let Err(e) = start_status_server(state, addr).await {
                        error!("Status API stopped: {}", e);
                    }
                }
                None => info!("Status API disabled (no status_port configured)"),
            }
            // Backups continue without the status API
            std::future::pending::<()>().await
        }
    };

    tokio::select! {
        result = scheduler.run() => {
            if let Err(e) = result {
                error!("Backup scheduler stopped: {}", e);
            }
        }
        _ = status_server => {}
        result = tokio::signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => error!("Failed to listen for shutdown signal: {}", e),
            }
        }
    }

    scheduler.discard_in_progress().await;
    info!("Backup manager stopped");
    Ok(())
}
