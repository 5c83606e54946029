//! Request/response filters wrapped around the route table.
//!
//! Filters are named `Router -> Router` transforms applied in order, so the
//! first filter in a [`FilterChain`] is innermost (closest to the handlers)
//! and the last one sees the request first. [`FilterConfig::chain`] builds
//! the standard chain:
//!
//! 1. request body limit
//! 2. gzip compression of responses (optional)
//! 3. permissive CORS (optional)
//! 4. panic catching, which turns a panicking handler into a `500`
//! 5. request tracing

use std::any::Any;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, Response, StatusCode};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub const DEFAULT_MAX_BODY: usize = 10 * 1024 * 1024;

type Filter = Box<dyn FnOnce(Router) -> Router + Send>;

#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub max_body: usize,
    pub cors: bool,
    pub compression: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_body: DEFAULT_MAX_BODY,
            cors: true,
            compression: true,
        }
    }
}

impl FilterConfig {
    #[must_use]
    pub fn chain(&self) -> FilterChain {
        let max_body = self.max_body;
        let mut chain = FilterChain::new().with("body-limit", move |router| {
            router.layer(
                ServiceBuilder::new()
                    .layer(DefaultBodyLimit::disable())
                    .layer(RequestBodyLimitLayer::new(max_body)),
            )
        });

        if self.compression {
            chain = chain.with("compression", |router| {
                router.layer(CompressionLayer::new())
            });
        }
        if self.cors {
            chain = chain.with("cors", |router| router.layer(CorsLayer::permissive()));
        }

        chain
            .with("catch-panic", |router| {
                router.layer(CatchPanicLayer::custom(panic_response))
            })
            .with("trace", |router| router.layer(TraceLayer::new_for_http()))
    }
}

#[derive(Default)]
pub struct FilterChain {
    filters: Vec<(&'static str, Filter)>,
}

impl FilterChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with<F>(mut self, name: &'static str, filter: F) -> Self
    where
        F: FnOnce(Router) -> Router + Send + 'static,
    {
        self.filters.push((name, Box::new(filter)));
        self
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|(name, _)| *name).collect()
    }

    pub fn apply(self, router: Router) -> Router {
        self.filters.into_iter().fold(router, |router, (name, filter)| {
            tracing::debug!(filter = name, "applying filter");
            filter(router)
        })
    }
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "request handler panicked");

    let mut response = Response::new(Body::from(
        "500 Internal Server Error: unexpected gateway fault\n",
    ));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
