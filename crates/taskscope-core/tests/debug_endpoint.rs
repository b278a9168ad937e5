//! End-to-end tests for the HTTP debug endpoint.
#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::tests_outside_test_module,
        reason = "Test allows"
    )
)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use taskscope_core::config::ServerConfig;
use taskscope_core::server::{HEALTH_PATH, serve, spawn};
use taskscope_core::snapshot::sort_by_id;
use taskscope_core::{Carrier, Registry, Snapshot, TaskId, TaskState, attach, build_tree};
use tokio::net::TcpListener;

fn loopback_config() -> ServerConfig {
    ServerConfig {
        listen: "127.0.0.1:0".to_owned(),
        ..ServerConfig::default()
    }
}

async fn start(registry: Arc<Registry>) -> SocketAddr {
    spawn(registry, &loopback_config())
        .await
        .expect("bind loopback")
        .expect("enabled registry binds")
}

async fn fetch(addr: SocketAddr, path: &str) -> reqwest::Response {
    reqwest::get(format!("http://{addr}{path}"))
        .await
        .expect("request debug endpoint")
}

#[tokio::test]
async fn test_endpoint_serves_snapshot_array() {
    let registry = Registry::new().shared();
    let (app, _) = attach(&registry, &Carrier::root(), "http-app");
    let (request, _) = attach(&registry, &app, "request /slow");
    let (_, query) = attach(&registry, &request, "query");
    query.expect("query task").done();
    request.mark_idle();

    let addr = start(Arc::clone(&registry)).await;
    let response = fetch(addr, "/debug/obs").await;
    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok()),
        Some("application/json")
    );

    let mut snapshots: Vec<Snapshot> = response.json().await.expect("decode snapshots");
    sort_by_id(&mut snapshots);
    let names: Vec<_> = snapshots.iter().map(|snapshot| snapshot.name.as_str()).collect();
    assert_eq!(names, ["http-app", "request /slow", "query"]);
    assert_eq!(snapshots[0].parent_id, TaskId::ROOT);
    assert_eq!(snapshots[1].state, TaskState::Idle);
    assert_eq!(snapshots[2].state, TaskState::Completed);

    let roots = build_tree(snapshots);
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].depth(), 3);
}

#[tokio::test]
async fn test_reading_endpoint_does_not_mutate() {
    let registry = Registry::new().shared();
    let (_, task) = attach(&registry, &Carrier::root(), "steady");
    let task = task.expect("task");
    task.mark_idle();

    let addr = start(Arc::clone(&registry)).await;
    for _ in 0..3 {
        let body: Vec<Snapshot> = fetch(addr, "/debug/obs")
            .await
            .json()
            .await
            .expect("decode snapshots");
        assert_eq!(body.len(), 1);
    }
    assert_eq!(task.state(), TaskState::Idle);
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_disabled_after_start_serves_empty_array() {
    let registry = Registry::new().shared();
    attach(&registry, &Carrier::root(), "hidden");
    let addr = start(Arc::clone(&registry)).await;

    registry.disable();
    let response = fetch(addr, "/debug/obs").await;
    assert!(response.status().is_success());
    assert_eq!(response.text().await.expect("body"), "[]");
}

#[tokio::test]
async fn test_spawn_skips_binding_when_disabled() {
    let registry = Registry::new().shared();
    registry.disable();
    let bound = spawn(registry, &loopback_config()).await.expect("spawn");
    assert!(bound.is_none());
}

#[tokio::test]
async fn test_serve_on_custom_path_and_health() {
    let registry = Registry::new().shared();
    attach(&registry, &Carrier::root(), "custom");
    let config = ServerConfig {
        listen: "127.0.0.1:0".to_owned(),
        path: "/tasks".to_owned(),
    };

    let listener = TcpListener::bind(&config.listen).await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let served = Arc::clone(&registry);
    tokio::spawn(async move { serve(listener, served, &config).await });

    let health = fetch(addr, HEALTH_PATH).await;
    assert!(health.status().is_success());
    assert_eq!(health.text().await.expect("body"), "ok");

    let body: Vec<Snapshot> = fetch(addr, "/tasks").await.json().await.expect("decode");
    assert_eq!(body.len(), 1);
    assert!(body[0].duration < Duration::from_secs(60));

    let missing = fetch(addr, "/debug/obs").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
