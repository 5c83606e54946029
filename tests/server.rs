//! Integration tests for the HTTP server, health endpoint, landing page,
//! and graceful shutdown.

mod common;

use std::time::Duration;

use wayfarer::health::HealthResponse;

#[tokio::test]
async fn health_endpoint_returns_healthy() {
    let gateway = common::start_gateway().await;

    let url = format!("http://{}/health", gateway.addr);
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 200);

    let health: HealthResponse = resp.json().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(health.upstream_timeout_ms, 5_000);
    assert_eq!(health.stats.requests_forwarded, 0);
    assert_eq!(health.stats.requests_failed, 0);

    let _ = gateway.shutdown.send(());
}

#[tokio::test]
async fn landing_page_is_served_at_root() {
    let gateway = common::start_gateway().await;

    let resp = reqwest::get(format!("http://{}/", gateway.addr))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_owned();
    assert!(content_type.starts_with("text/html"));
    assert!(resp.text().await.unwrap().contains("/proxy/"));

    let _ = gateway.shutdown.send(());
}

#[tokio::test]
async fn unmatched_route_returns_404() {
    let gateway = common::start_gateway().await;

    let resp = reqwest::get(format!("http://{}/nonexistent", gateway.addr))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(resp.text().await.unwrap(), "404 Not Found\n");

    let _ = gateway.shutdown.send(());
}

#[tokio::test]
async fn static_dir_replaces_landing_page() {
    let dir = std::env::temp_dir().join(format!("wayfarer-static-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>custom</h1>").unwrap();
    std::fs::write(dir.join("app.css"), "body{}").unwrap();

    let options = wayfarer::server::RouterOptions {
        static_dir: Some(dir.clone()),
        ..Default::default()
    };
    let router = wayfarer::server::build_router(
        common::test_state(Duration::from_secs(5)),
        &options,
    );
    let gateway = common::serve(router).await;

    let root = reqwest::get(format!("http://{}/", gateway.addr)).await.unwrap();
    assert_eq!(root.text().await.unwrap(), "<h1>custom</h1>");

    let css = reqwest::get(format!("http://{}/app.css", gateway.addr))
        .await
        .unwrap();
    assert_eq!(css.status(), 200);

    let missing = reqwest::get(format!("http://{}/nope.js", gateway.addr))
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);

    let _ = gateway.shutdown.send(());
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn graceful_shutdown_works() {
    let gateway = common::start_gateway().await;

    let url = format!("http://{}/health", gateway.addr);
    assert!(reqwest::get(&url).await.is_ok());

    let _ = gateway.shutdown.send(());
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(reqwest::get(&url).await.is_err());
}
