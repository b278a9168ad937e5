//! HTTP debug endpoint serving the snapshot array.
//!
//! Reading the endpoint never mutates task state. A disabled registry serves
//! an empty array rather than an error.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::serve as axum_serve;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::registry::Registry;
use crate::snapshot::Snapshot;

/// Route answering liveness probes.
pub const HEALTH_PATH: &str = "/healthz";

/// Builds the debug router with the snapshot array mounted at `path`.
pub fn router(registry: Arc<Registry>, path: &str) -> Router {
    Router::new()
        .route(path, get(export_snapshots))
        .route(HEALTH_PATH, get(health))
        .with_state(registry)
}

/// Serves the debug endpoint on an already bound listener until it fails.
///
/// # Errors
/// Returns an error if the underlying server stops with an I/O error.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<Registry>,
    config: &ServerConfig,
) -> Result<()> {
    let app = router(registry, &config.path);
    axum_serve(listener, app).await?;
    Ok(())
}

/// Binds `config.listen` and serves the endpoint on a background task.
///
/// Returns the bound address, or `None` without binding anything when the
/// registry is disabled.
///
/// # Errors
/// Returns an error if the address cannot be bound.
pub async fn spawn(registry: Arc<Registry>, config: &ServerConfig) -> Result<Option<SocketAddr>> {
    if !registry.is_enabled() {
        return Ok(None);
    }

    let listener = TcpListener::bind(&config.listen).await?;
    let addr = listener.local_addr()?;
    let app = router(registry, &config.path);
    tokio::spawn(async move {
        if let Err(error) = axum_serve(listener, app).await {
            warn!("taskscope debug endpoint stopped: {error}");
        }
    });

    info!("taskscope debug endpoint listening on http://{addr}{}", config.path);
    Ok(Some(addr))
}

async fn export_snapshots(State(registry): State<Arc<Registry>>) -> Json<Vec<Snapshot>> {
    Json(registry.snapshot())
}

async fn health() -> &'static str {
    "ok"
}
