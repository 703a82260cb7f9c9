use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use tracing::error;

use roomboard_db::Database;
use roomboard_gateway::Hub;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub hub: Hub,
    /// Directory uploads are written to and served from at `/uploads`.
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

/// Run a blocking datastore call off the async runtime.
pub async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow!("blocking task failed: {}", e))
        })?
        .map_err(ApiError::Internal)
}
