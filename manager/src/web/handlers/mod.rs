pub mod backups;
pub mod common;

pub use backups::{get_metadata, get_progress, list_backups};
pub use common::{ApiResponse, ApiResult};
