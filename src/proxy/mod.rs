//! The `/proxy/<segment>/...` gateway.
//!
//! [`gateway_handler`] runs each request through a linear pipeline:
//! resolve the target ([`target`]), forward it ([`forward`]), then sanitize
//! and possibly rewrite the response ([`response`], [`rewrite`]). Any
//! failure is logged here and turned into a status code by
//! [`GatewayError`]; nothing escapes the handler.

pub mod forward;
pub mod headers;
pub mod response;
pub mod rewrite;
pub mod routing;
pub mod target;
pub mod user_agent;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, Uri};
use axum::response::{IntoResponse, Response};
use tracing::Instrument;

use crate::error::GatewayError;
use crate::server::AppState;
use forward::ProxyRequest;
use response::ResponseClass;
use rewrite::RewriteContext;

pub async fn gateway_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    req_headers: HeaderMap,
    body: Bytes,
) -> Response {
    let correlation_id = req_headers
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

    let span = tracing::info_span!("gateway", correlation_id = %correlation_id);
    let path = uri.path().to_string();

    let result = handle(&state, method.clone(), &uri, req_headers, body)
        .instrument(span.clone())
        .await;

    let mut response = match result {
        Ok((response, class)) => {
            state.stats.forwarded.fetch_add(1, Ordering::Relaxed);
            if class == ResponseClass::Html {
                state.stats.rewritten.fetch_add(1, Ordering::Relaxed);
            }
            response
        }
        Err(e) => {
            state.stats.failed.fetch_add(1, Ordering::Relaxed);
            span.in_scope(|| {
                let status = e.status();
                if status.is_server_error() {
                    tracing::error!(
                        method = %method,
                        path = %path,
                        status = status.as_u16(),
                        error = %e,
                        "gateway request failed"
                    );
                } else {
                    tracing::warn!(
                        method = %method,
                        path = %path,
                        status = status.as_u16(),
                        error = %e,
                        "gateway request rejected"
                    );
                }
            });
            e.into_response()
        }
    };

    if let Ok(val) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert("x-correlation-id", val);
    }
    response
}

async fn handle(
    state: &AppState,
    method: Method,
    uri: &Uri,
    req_headers: HeaderMap,
    body: Bytes,
) -> Result<(Response, ResponseClass), GatewayError> {
    let split = routing::split_proxy_path(uri.path())
        .ok_or_else(|| GatewayError::Internal(format!("'{}' is not a gateway path", uri.path())))?;

    // Received -> TargetResolved
    let origin = target::resolve(split.segment)?;
    let ctx = RewriteContext::new(split.segment);

    // TargetResolved -> Forwarded
    let request = ProxyRequest {
        method: method.clone(),
        original_path: uri.path().to_string(),
        path_and_query: routing::upstream_path_and_query(split.rest, uri.query()),
        headers: req_headers,
        body,
    };
    let upstream = forward::forward(&state.http_client, &origin, request, &state.policy).await?;

    // Forwarded -> Rewritten
    let (response, class) = response::rewrite(upstream, &ctx, &method).await?;
    tracing::debug!(
        status = response.status().as_u16(),
        rewritten = class == ResponseClass::Html,
        "upstream response ready"
    );
    Ok((response, class))
}
