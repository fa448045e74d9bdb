use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use dumper::store::resolve_redis_url;
use dumper::validate::{compare_stores, write_diff_report};
use dumper::{run_dump, DumpOptions, DumpProgress, RedisStore, StoreConnector};

/// Dump a Redis keyspace as a replayable RESP command log
#[derive(Parser, Debug)]
#[command(name = "dumper", version)]
struct Cli {
    /// Source Redis URL
    #[arg(long, env = "REDIS_URL")]
    redis_url: String,

    /// Verify TLS certificates of rediss:// servers
    #[arg(long, env = "REDIS_TLS_VERIFY")]
    tls_verify: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write every matching key to a RESP file
    Dump {
        output: PathBuf,

        #[command(flatten)]
        options: DumpOptions,
    },
    /// Compare a restored server against the source
    Validate {
        restored_url: String,

        #[arg(default_value = "backup-validation.log")]
        report: PathBuf,

        #[command(flatten)]
        options: DumpOptions,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::from_default_env()
        .add_directive("dumper=info".parse()?)
        .add_directive("redis=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    let tls_insecure = !cli.tls_verify;
    let source_url = resolve_redis_url(&cli.redis_url, tls_insecure);

    match cli.command {
        Command::Dump { output, options } => {
            options.validate()?;
            let key_count =
                run_dump(&source_url, &output, &options, Arc::new(DumpProgress::new())).await?;
            info!(
                "Backup written to {} ({} keys at start)",
                output.display(),
                key_count
            );
        }
        Command::Validate {
            restored_url,
            report,
            options,
        } => {
            options.validate()?;

            let reference = RedisStore::connect(&source_url).await?;
            reference.ping().await?;
            reference.select(options.db).await?;
            let candidate =
                RedisStore::connect(&resolve_redis_url(&restored_url, tls_insecure)).await?;
            candidate.ping().await?;
            candidate.select(options.db).await?;

            let diffs = compare_stores(
                &reference,
                &candidate,
                &options.keys_match,
                options.scan_batch_size,
                Arc::new(DumpProgress::new()),
            )
            .await?;
            write_diff_report(&diffs, &report).await?;

            if diffs.is_empty() {
                info!("Restored store matches the source");
            } else {
                warn!("{} keys differ, see {}", diffs.len(), report.display());
            }
        }
    }

    Ok(())
}
