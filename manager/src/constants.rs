//! Central repository for file naming conventions, defaults and timeouts

use std::time::Duration;

/// Backup directory layout
pub mod files {
    /// Every dump file name starts with this prefix; retention only ever
    /// touches files carrying it
    pub const BACKUP_FILE_PREFIX: &str = "redis-backup";

    pub const BACKUP_FILE_EXTENSION: &str = "resp";

    /// Local start time of the run, second precision
    pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub const METADATA_FILE_NAME: &str = "metadata.json";
}

/// Default configuration values
pub mod defaults {
    pub const BACKUPS_DIR: &str = "backups";

    /// Backup period in hours
    pub const PERIOD_HOURS: f64 = 1.0;

    /// Number of most recent backups to keep
    pub const KEEP_LAST: usize = 24;

    /// Placeholder meaning "read the URL from REDIS_URL"
    pub const REDIS_URL_FROM_ENV: &str = "_env";
}

/// Environment variables consulted at startup
pub mod env {
    pub const REDIS_URL: &str = "REDIS_URL";

    pub const ALARM_WEBHOOK_URL: &str = "ALARM_WEBHOOK_URL";
}

/// Alert system constants
pub mod alerts {
    use super::Duration;

    /// Webhook request timeout
    pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);
}
