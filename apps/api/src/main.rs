//! # Shopdesk API server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Shopdesk API Server                             │
//! │                                                                         │
//! │  Client ───► HTTP (8000) ───► Routes ───► SQLite                       │
//! │                                  │                                      │
//! │                                  ▼                                      │
//! │                             Cloudinary                                  │
//! │                           (product images)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use shopdesk_api::{images, init_tracing, router, ApiConfig, AppState};
use shopdesk_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::load().context("Failed to load configuration")?;

    init_tracing(config.json_logs);
    info!("Starting Shopdesk API server...");
    info!(
        port = config.port,
        db_url = %config.database_url,
        algorithm = ?config.algorithm,
        "Configuration loaded"
    );

    // Connect to database (migrations run on connect)
    let db = Database::new(
        DbConfig::from_url(&config.database_url).max_connections(config.db_max_connections),
    )
    .await
    .context("Failed to open database")?;
    info!("Database ready");

    if config.cloudinary.is_none() {
        warn!("Cloudinary is not configured; product image uploads will fail");
    }
    let images = images::image_store(&config).context("Failed to build image uploader")?;

    let addr = config.socket_addr()?;
    let state = AppState::new(db.clone(), config, images);
    let app = router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
