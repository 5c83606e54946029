//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared state holding the HTTP client,
//! forwarding policy, stats, and uptime), [`build_router`] for the route
//! table wrapped in the filter chain, [`build_http_client`] for the
//! connection-pooled hyper client, and [`shutdown_signal`] for
//! SIGTERM / Ctrl+C handling.

use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::handler::HandlerWithoutStateExt;
use axum::routing::{any, get};
use axum::Router;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower_http::services::{ServeDir, ServeFile};

use crate::health::health_handler;
use crate::landing;
use crate::middleware::FilterConfig;
use crate::proxy;
use crate::proxy::forward::ForwardPolicy;

#[derive(Debug)]
pub struct Stats {
    pub forwarded: AtomicU64,
    pub rewritten: AtomicU64,
    pub failed: AtomicU64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            forwarded: AtomicU64::new(0),
            rewritten: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }
}

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, http_body_util::Full<bytes::Bytes>>;

pub struct AppState {
    pub http_client: HttpClient,
    pub policy: ForwardPolicy,
    pub start_time: Instant,
    pub stats: Stats,
}

impl AppState {
    #[must_use]
    pub fn new(http_client: HttpClient, policy: ForwardPolicy) -> Self {
        Self {
            http_client,
            policy,
            start_time: Instant::now(),
            stats: Stats::new(),
        }
    }
}

/// Route-table options that are not part of the filter chain.
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    pub filters: FilterConfig,
    /// Serve `/` and unmatched paths from this directory instead of the
    /// built-in landing page.
    pub static_dir: Option<PathBuf>,
}

#[must_use]
pub fn build_http_client() -> HttpClient {
    // When multiple rustls crypto providers are compiled in, rustls cannot
    // auto-detect which one to use. Explicitly install `ring`.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .build(https)
}

pub fn build_router(state: Arc<AppState>, options: &RouterOptions) -> Router {
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/proxy", any(proxy::gateway_handler))
        .route("/proxy/", any(proxy::gateway_handler))
        .route("/proxy/{*rest}", any(proxy::gateway_handler));

    let router = match options.static_dir {
        Some(ref dir) => router
            .route_service("/", ServeFile::new(dir.join("index.html")))
            .fallback_service(
                ServeDir::new(dir).not_found_service(landing::not_found.into_service()),
            ),
        None => router
            .route("/", get(landing::landing_page))
            .fallback(landing::not_found),
    };

    options.filters.chain().apply(router.with_state(state))
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
