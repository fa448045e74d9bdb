pub mod backup;
pub mod config;
pub mod constants;
pub mod scheduler;
pub mod services;
pub mod web;

// Re-export commonly used types
pub use backup::{BackupRun, MetadataLedger};
pub use config::{Config, ConfigManager};
pub use scheduler::{BackupScheduler, DumpRunner, RedisDumpRunner};
pub use services::AlertService;
