//! Shared harness: a mock upstream and a gateway instance on loopback ports.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use wayfarer::proxy::forward::ForwardPolicy;
use wayfarer::proxy::target;
use wayfarer::proxy::user_agent::FixedUserAgent;
use wayfarer::server::{self, AppState, RouterOptions};

pub const TEST_AGENT: &str = "wayfarer-test-agent";

pub struct Running {
    pub addr: SocketAddr,
    pub shutdown: tokio::sync::oneshot::Sender<()>,
}

pub async fn serve(router: Router) -> Running {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    Running { addr, shutdown }
}

pub fn test_state(timeout: Duration) -> Arc<AppState> {
    Arc::new(AppState::new(
        server::build_http_client(),
        ForwardPolicy {
            timeout,
            user_agent: Arc::new(FixedUserAgent::new(TEST_AGENT)),
        },
    ))
}

pub async fn start_gateway() -> Running {
    start_gateway_with_timeout(Duration::from_secs(5)).await
}

pub async fn start_gateway_with_timeout(timeout: Duration) -> Running {
    serve(server::build_router(
        test_state(timeout),
        &RouterOptions::default(),
    ))
    .await
}

/// `http://<gateway>/proxy/<encoded upstream>`
pub fn gateway_prefix(gateway: SocketAddr, upstream: &str) -> String {
    format!("http://{gateway}/proxy/{}", target::encode(upstream))
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
