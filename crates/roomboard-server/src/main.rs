mod config;

use std::sync::Arc;

use tracing::info;

use roomboard_api::{AppState, AppStateInner};
use roomboard_gateway::Hub;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roomboard=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database and upload directory
    let db = roomboard_db::Database::open(&config.db_path)?;
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    // The hub lives exactly as long as the server
    let hub = Hub::new(config.broadcast_scope);
    let state: AppState = Arc::new(AppStateInner {
        db,
        hub: hub.clone(),
        upload_dir: config.upload_dir.clone(),
        max_upload_bytes: config.max_upload_bytes,
    });

    let app = roomboard_api::router(state);

    let addr = config.addr()?;
    info!("roomboard listening on {}", addr);
    info!(
        "Uploads in {} (max {} bytes), broadcast scope {:?}",
        config.upload_dir.display(),
        config.max_upload_bytes,
        config.broadcast_scope
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(hub))
        .await?;

    Ok(())
}

async fn shutdown_signal(hub: Hub) {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }

    // Ends every push-channel connection so shutdown is not held open
    hub.close_all().await;
}
