//! An HTTP app tracking one task per request, with the debug endpoint on a
//! side port. Inspect it with `taskscope tree --watch`.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::routing::get;
use axum::{Router, serve};
use taskscope_core::server::spawn;
use taskscope_core::{Carrier, Registry, TaskscopeConfig, attach};
use tokio::net::TcpListener;
use tokio::time::sleep;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
struct AppState {
    registry: Arc<Registry>,
    root: Carrier,
}

#[tokio::main]
async fn main() -> taskscope_core::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = TaskscopeConfig::default().apply_env()?;
    let registry = Registry::from_config(&config).shared();
    spawn(Arc::clone(&registry), &config.server).await?;

    let (root, _) = attach(&registry, &Carrier::root(), "http-app");
    let state = AppState { registry, root };

    let app = Router::new()
        .route("/fast", get(fast))
        .route("/slow", get(slow))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:8080").await?;
    info!("app listening on http://127.0.0.1:8080");
    serve(listener, app).await?;
    Ok(())
}

async fn fast(State(state): State<AppState>) -> &'static str {
    handle(&state, "request /fast", Duration::from_millis(500)).await
}

async fn slow(State(state): State<AppState>) -> &'static str {
    handle(&state, "request /slow", Duration::from_secs(3)).await
}

async fn handle(state: &AppState, name: &str, delay: Duration) -> &'static str {
    let (request, _) = attach(&state.registry, &state.root, name);
    request.mark_active();
    sleep(delay).await;
    request.mark_idle();
    request.done();
    "done\n"
}
