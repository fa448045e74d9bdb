// Backup progress and history endpoints

use axum::{extract::State, response::Json};
use serde::Serialize;
use tracing::error;

use super::common::{internal_error, ApiResponse, ApiResult};
use crate::backup::{list_backup_files, BackupFile, BackupRun};
use crate::web::AppState;

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub running: bool,
    pub keys_processed: u64,
    pub keys_total: u64,
    pub current_file: Option<String>,
}

pub async fn get_progress(State(state): State<AppState>) -> ApiResult<ProgressResponse> {
    let snapshot = state.progress.snapshot();
    let current_file = state
        .current_dump
        .read()
        .await
        .as_ref()
        .and_then(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned());

    Ok(Json(ApiResponse::success(ProgressResponse {
        running: snapshot.running,
        keys_processed: snapshot.keys_processed,
        keys_total: snapshot.keys_total,
        current_file,
    })))
}

/// Dump files currently on disk, newest first
pub async fn list_backups(State(state): State<AppState>) -> ApiResult<Vec<BackupFile>> {
    match list_backup_files(&state.config.backups_dir).await {
        Ok(files) => Ok(Json(ApiResponse::success(files))),
        Err(e) => {
            error!("Failed to list backups: {}", e);
            Err(internal_error(e.to_string()))
        }
    }
}

pub async fn get_metadata(State(state): State<AppState>) -> ApiResult<Vec<BackupRun>> {
    match state.ledger.load().await {
        Ok(runs) => Ok(Json(ApiResponse::success(runs))),
        Err(e) => {
            error!("Failed to read backup ledger: {}", e);
            Err(internal_error(e.to_string()))
        }
    }
}
