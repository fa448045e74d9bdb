use crate::web::{handlers, AppState};
use anyhow::{anyhow, Result};
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

/// Serve the read-only status API until the listener fails
pub async fn start_status_server(state: AppState, addr: String) -> Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow!("Failed to bind status API on {}: {}", addr, e))?;
    tracing::info!("Status API running on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/progress", get(handlers::get_progress))
        .route("/api/backups", get(handlers::list_backups))
        .route("/api/metadata", get(handlers::get_metadata))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
