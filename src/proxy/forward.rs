//! Single-attempt forwarding of a client request to its upstream origin.
//!
//! The outbound URL is the resolved origin joined with whatever followed
//! `/proxy/<segment>` in the client path, plus the original query. The
//! upstream has a bounded time to produce response headers; the same
//! deadline later bounds HTML buffering in [`super::response`].

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use tokio::time::Instant;

use super::headers::build_forwarded_headers;
use super::target::Origin;
use super::user_agent::UserAgentStrategy;
use crate::error::GatewayError;
use crate::server::HttpClient;

/// How requests leave the gateway.
#[derive(Clone)]
pub struct ForwardPolicy {
    pub timeout: Duration,
    pub user_agent: Arc<dyn UserAgentStrategy>,
}

impl std::fmt::Debug for ForwardPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardPolicy")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct ProxyRequest {
    pub method: Method,
    /// The path the client requested, for logging.
    pub original_path: String,
    /// Path and query with the `/proxy/<segment>` prefix stripped.
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Incoming,
    /// The full upstream URL, for logging.
    pub target: String,
    pub deadline: Instant,
    pub timeout: Duration,
}

pub async fn forward(
    client: &HttpClient,
    origin: &Origin,
    request: ProxyRequest,
    policy: &ForwardPolicy,
) -> Result<UpstreamResponse, GatewayError> {
    let joined = origin.join(&request.path_and_query);
    let target_url = url::Url::parse(&joined).map_err(|e| GatewayError::InvalidUpstream {
        target: joined.clone(),
        reason: e.to_string(),
    })?;
    let target = target_url.to_string();

    let uri: hyper::Uri = target.parse().map_err(|e: hyper::http::uri::InvalidUri| {
        GatewayError::InvalidUpstream {
            target: target.clone(),
            reason: e.to_string(),
        }
    })?;

    tracing::info!(
        method = %request.method,
        path = %request.original_path,
        target = %target,
        "forwarding request"
    );

    let forwarded_headers =
        build_forwarded_headers(&request.headers, &target_url, policy.user_agent.as_ref());

    let mut outbound = hyper::Request::builder()
        .method(request.method)
        .uri(uri)
        .body(Full::new(request.body))
        .map_err(|e| GatewayError::Internal(format!("failed to build upstream request: {e}")))?;
    *outbound.headers_mut() = forwarded_headers;

    let deadline = Instant::now() + policy.timeout;
    let response = tokio::time::timeout_at(deadline, client.request(outbound))
        .await
        .map_err(|_| GatewayError::UpstreamTimeout {
            target: target.clone(),
            timeout_ms: policy.timeout.as_millis(),
        })?
        .map_err(|e| GatewayError::UpstreamUnreachable {
            target: target.clone(),
            source: Box::new(e),
        })?;

    let (parts, body) = response.into_parts();
    Ok(UpstreamResponse {
        status: parts.status,
        headers: parts.headers,
        body,
        target,
        deadline,
        timeout: policy.timeout,
    })
}
