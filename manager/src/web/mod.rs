pub mod handlers;
pub mod server;

pub use server::{create_router, start_status_server};

use dumper::DumpProgress;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::backup::MetadataLedger;
use crate::config::Config;

// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub progress: Arc<DumpProgress>,
    pub ledger: Arc<MetadataLedger>,
    pub current_dump: Arc<RwLock<Option<PathBuf>>>,
}
