//! Response classification: stream through or buffer and rewrite.
//!
//! Headers are sanitized first for every response. HTML documents are then
//! buffered in full (bounded by the request deadline), rewritten, and sent
//! with a recomputed length; everything else streams through untouched.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;

use super::forward::UpstreamResponse;
use super::headers::sanitize_response_headers;
use super::rewrite::{rewrite_html, rewrite_location, RewriteContext};
use crate::error::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Html,
    PassThrough,
}

#[must_use]
pub fn is_html(headers: &HeaderMap) -> bool {
    headers.get(header::CONTENT_TYPE).is_some_and(|value| {
        String::from_utf8_lossy(value.as_bytes())
            .to_ascii_lowercase()
            .contains("text/html")
    })
}

fn has_encoded_body(headers: &HeaderMap) -> bool {
    headers.get(header::CONTENT_ENCODING).is_some_and(|value| {
        !value.as_bytes().eq_ignore_ascii_case(b"identity")
    })
}

/// Decide how the body of an upstream response is handled.
#[must_use]
pub fn classify(method: &Method, status: StatusCode, headers: &HeaderMap) -> ResponseClass {
    let bodiless = *method == Method::HEAD
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED;

    if bodiless || !is_html(headers) || has_encoded_body(headers) {
        ResponseClass::PassThrough
    } else {
        ResponseClass::Html
    }
}

fn rewrite_location_header(headers: &mut HeaderMap, ctx: &RewriteContext) {
    let rewritten = headers
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|location| rewrite_location(location, ctx))
        .and_then(|location| HeaderValue::from_str(&location).ok());
    if let Some(value) = rewritten {
        headers.insert(header::LOCATION, value);
    }
}

pub async fn rewrite(
    upstream: UpstreamResponse,
    ctx: &RewriteContext,
    method: &Method,
) -> Result<(Response, ResponseClass), GatewayError> {
    let UpstreamResponse {
        status,
        mut headers,
        body,
        target,
        deadline,
        timeout,
    } = upstream;

    sanitize_response_headers(&mut headers);
    rewrite_location_header(&mut headers, ctx);

    let class = classify(method, status, &headers);
    if class == ResponseClass::PassThrough && is_html(&headers) && has_encoded_body(&headers) {
        tracing::warn!(target = %target, "compressed HTML from upstream, passing through");
    }

    let body = match class {
        ResponseClass::PassThrough => Body::new(body),
        ResponseClass::Html => {
            let collected = tokio::time::timeout_at(deadline, body.collect())
                .await
                .map_err(|_| GatewayError::UpstreamTimeout {
                    target: target.clone(),
                    timeout_ms: timeout.as_millis(),
                })?
                .map_err(|e| GatewayError::UpstreamBody {
                    target: target.clone(),
                    source: Box::new(e),
                })?
                .to_bytes();

            let html = String::from_utf8_lossy(&collected);
            let rewritten = rewrite_html(&html, ctx);
            tracing::debug!(
                target = %target,
                original_bytes = collected.len(),
                rewritten_bytes = rewritten.len(),
                "rewrote HTML document"
            );
            // Length changed; the server derives it from the new body.
            headers.remove(header::CONTENT_LENGTH);
            Body::from(rewritten)
        }
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok((response, class))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(*v));
        }
        map
    }

    #[test]
    fn html_detection_is_case_insensitive_substring() {
        assert!(is_html(&headers(&[("content-type", "text/html")])));
        assert!(is_html(&headers(&[(
            "content-type",
            "Text/HTML; charset=utf-8"
        )])));
        assert!(!is_html(&headers(&[("content-type", "text/css")])));
        assert!(!is_html(&HeaderMap::new()));
    }

    #[test]
    fn html_get_is_rewritten() {
        let h = headers(&[("content-type", "text/html")]);
        assert_eq!(classify(&Method::GET, StatusCode::OK, &h), ResponseClass::Html);
        assert_eq!(
            classify(&Method::POST, StatusCode::NOT_FOUND, &h),
            ResponseClass::Html
        );
    }

    #[test]
    fn bodiless_responses_pass_through() {
        let h = headers(&[("content-type", "text/html")]);
        assert_eq!(
            classify(&Method::HEAD, StatusCode::OK, &h),
            ResponseClass::PassThrough
        );
        assert_eq!(
            classify(&Method::GET, StatusCode::NOT_MODIFIED, &h),
            ResponseClass::PassThrough
        );
        assert_eq!(
            classify(&Method::GET, StatusCode::NO_CONTENT, &h),
            ResponseClass::PassThrough
        );
    }

    #[test]
    fn compressed_html_passes_through() {
        let h = headers(&[("content-type", "text/html"), ("content-encoding", "gzip")]);
        assert_eq!(
            classify(&Method::GET, StatusCode::OK, &h),
            ResponseClass::PassThrough
        );

        let h = headers(&[
            ("content-type", "text/html"),
            ("content-encoding", "identity"),
        ]);
        assert_eq!(classify(&Method::GET, StatusCode::OK, &h), ResponseClass::Html);
    }

    #[test]
    fn missing_content_type_passes_through() {
        assert_eq!(
            classify(&Method::GET, StatusCode::OK, &HeaderMap::new()),
            ResponseClass::PassThrough
        );
    }

    #[test]
    fn relative_location_is_routed() {
        let ctx = RewriteContext::new("abc");
        let mut h = headers(&[("location", "/login?next=/")]);
        rewrite_location_header(&mut h, &ctx);
        assert_eq!(h.get("location").unwrap(), "/proxy/abc/login?next=/");

        let mut h = headers(&[("location", "https://other.example/")]);
        rewrite_location_header(&mut h, &ctx);
        assert_eq!(h.get("location").unwrap(), "https://other.example/");
    }
}
