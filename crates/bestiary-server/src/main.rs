//! Bestiary design API server.
//!
//! Reads configuration from environment variables (see [`Config`]), opens
//! (or creates) the SQLite store at `BESTIARY_DB_PATH`, then serves the JSON
//! API until SIGINT.
//!
//! ## Quick start
//!
//! ```bash
//! # Development (local db file, port 8080, info log)
//! cargo run --bin bestiary-server --release
//!
//! # Custom config
//! BESTIARY_PORT=9090 \
//! BESTIARY_DB_PATH=/mnt/data/bestiary.db \
//! BESTIARY_LOG_LEVEL=debug \
//!   cargo run --bin bestiary-server --release
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use bestiary_server::{app, Config};
use bestiary_store::DesignStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Tracing ───────────────────────────────────────────────────────────────
    let config = Config::from_env();

    let filter = EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .compact()
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        db_path = %config.db_path,
        port    = config.port,
        "bestiary server starting"
    );

    // ── Open store ────────────────────────────────────────────────────────────
    if let Some(parent) = Path::new(&config.db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = DesignStore::open(&config.db_path)
        .map_err(|e| anyhow::anyhow!("failed to open store at {}: {e}", config.db_path))?;

    let counts = store.counts()?;
    info!(
        classes       = counts.classes,
        attributes    = counts.attributes,
        entities      = counts.entities,
        specificities = counts.specificities,
        connections   = counts.connections,
        "store loaded"
    );

    // ── HTTP server ───────────────────────────────────────────────────────────
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let router = app(Arc::new(Mutex::new(store)));

    info!(%addr, "API listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("received SIGINT — shutting down gracefully");
        })
        .await?;

    info!("bestiary server shutdown complete");
    Ok(())
}
