//! Header construction for the upstream request and sanitation of the
//! upstream response.
//!
//! [`build_forwarded_headers`] clones the client headers, strips hop-by-hop
//! headers and `accept-encoding`, rewrites `Host` for the upstream, and
//! applies the browser-identity overrides. [`sanitize_response_headers`]
//! removes the hardening headers that would stop a rewritten page from
//! working under the gateway's origin.

use std::sync::LazyLock;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use super::user_agent::UserAgentStrategy;

const DEFAULT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "transfer-encoding",
        "te",
        "trailer",
        "upgrade",
        "proxy-authorization",
        "proxy-authenticate",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

/// Response headers that block framing or script execution of the
/// rewritten page.
pub static HARDENING_HEADERS: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "content-security-policy",
        "content-security-policy-report-only",
        "x-frame-options",
        "strict-transport-security",
        "x-content-type-options",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}

/// Remove hardening and hop-by-hop headers from an upstream response.
/// `content-length` is left alone; the caller drops it when the body changes.
pub fn sanitize_response_headers(headers: &mut HeaderMap) {
    for name in HARDENING_HEADERS.iter() {
        headers.remove(name);
    }
    strip_hop_by_hop(headers);
}

pub fn build_forwarded_headers(
    original: &HeaderMap,
    target_url: &url::Url,
    user_agent: &dyn UserAgentStrategy,
) -> HeaderMap {
    let mut headers = original.clone();

    strip_hop_by_hop(&mut headers);
    // Upstream answers uncompressed so HTML can be rewritten; the gateway
    // compresses on the way out.
    headers.remove(header::ACCEPT_ENCODING);
    headers.remove(header::CONTENT_LENGTH);

    let authority = target_url.host_str().map(|host| {
        target_url
            .port()
            .map_or_else(|| host.to_string(), |port| format!("{host}:{port}"))
    });

    // Rewrite Host
    headers.remove(header::HOST);
    if let Some(ref authority) = authority {
        if let Ok(val) = HeaderValue::from_str(authority) {
            headers.insert(header::HOST, val);
        }
    }

    match HeaderValue::from_str(user_agent.choose()) {
        Ok(val) => {
            headers.insert(header::USER_AGENT, val);
        }
        Err(_) => {
            tracing::warn!("invalid user agent value, forwarding client user agent");
        }
    }

    // Referer and Origin point at the gateway; point them at the upstream instead.
    if let Some(ref authority) = authority {
        let upstream_origin = format!("{}://{authority}", target_url.scheme());
        if headers.contains_key(header::REFERER) {
            if let Ok(val) = HeaderValue::from_str(&format!("{upstream_origin}/")) {
                headers.insert(header::REFERER, val);
            }
        }
        if headers.contains_key(header::ORIGIN) {
            if let Ok(val) = HeaderValue::from_str(&upstream_origin) {
                headers.insert(header::ORIGIN, val);
            }
        }
    }

    if !headers.contains_key(header::ACCEPT) {
        headers.insert(header::ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
    }
    if !headers.contains_key(header::ACCEPT_LANGUAGE) {
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE),
        );
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::user_agent::FixedUserAgent;

    fn forward(original: &HeaderMap, target: &str) -> HeaderMap {
        let target = url::Url::parse(target).unwrap();
        build_forwarded_headers(original, &target, &FixedUserAgent::new("fixed-agent"))
    }

    #[test]
    fn strips_hop_by_hop() {
        let mut original = HeaderMap::new();
        original.insert("connection", "keep-alive".parse().unwrap());
        original.insert("content-type", "application/json".parse().unwrap());

        let result = forward(&original, "http://target:8080");

        assert!(result.get("connection").is_none());
        assert!(result.get("content-type").is_some());
    }

    #[test]
    fn rewrites_host() {
        let mut original = HeaderMap::new();
        original.insert("host", "gateway.local:3000".parse().unwrap());

        let result = forward(&original, "http://backend:9090/path");
        assert_eq!(result.get("host").unwrap(), "backend:9090");

        let result = forward(&original, "https://example.com/");
        assert_eq!(result.get("host").unwrap(), "example.com");
    }

    #[test]
    fn overrides_user_agent() {
        let mut original = HeaderMap::new();
        original.insert("user-agent", "curl/8.0".parse().unwrap());

        let result = forward(&original, "https://example.com");
        assert_eq!(result.get("user-agent").unwrap(), "fixed-agent");
    }

    #[test]
    fn drops_accept_encoding() {
        let mut original = HeaderMap::new();
        original.insert("accept-encoding", "gzip, br".parse().unwrap());

        let result = forward(&original, "https://example.com");
        assert!(result.get("accept-encoding").is_none());
    }

    #[test]
    fn points_referer_and_origin_at_upstream() {
        let mut original = HeaderMap::new();
        original.insert(
            "referer",
            "http://gateway.local/proxy/abc/page".parse().unwrap(),
        );
        original.insert("origin", "http://gateway.local".parse().unwrap());

        let result = forward(&original, "https://example.com:8443/x");
        assert_eq!(result.get("referer").unwrap(), "https://example.com:8443/");
        assert_eq!(result.get("origin").unwrap(), "https://example.com:8443");
    }

    #[test]
    fn no_referer_is_invented() {
        let result = forward(&HeaderMap::new(), "https://example.com");
        assert!(result.get("referer").is_none());
        assert!(result.get("origin").is_none());
    }

    #[test]
    fn fills_browser_accept_defaults_only_when_absent() {
        let result = forward(&HeaderMap::new(), "https://example.com");
        assert_eq!(result.get("accept").unwrap(), DEFAULT_ACCEPT);
        assert_eq!(result.get("accept-language").unwrap(), DEFAULT_ACCEPT_LANGUAGE);

        let mut original = HeaderMap::new();
        original.insert("accept", "application/json".parse().unwrap());
        let result = forward(&original, "https://example.com");
        assert_eq!(result.get("accept").unwrap(), "application/json");
    }

    #[test]
    fn forwards_other_headers_unchanged() {
        let mut original = HeaderMap::new();
        original.insert("cookie", "a=1".parse().unwrap());
        original.append("x-custom", "one".parse().unwrap());
        original.append("x-custom", "two".parse().unwrap());

        let result = forward(&original, "https://example.com");
        assert_eq!(result.get("cookie").unwrap(), "a=1");
        assert_eq!(result.get_all("x-custom").iter().count(), 2);
    }

    #[test]
    fn sanitizes_hardening_headers_case_insensitively() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Content-Security-Policy".parse::<HeaderName>().unwrap(),
            "default-src 'self'".parse().unwrap(),
        );
        headers.insert(
            "content-security-policy-report-only",
            "default-src 'self'".parse().unwrap(),
        );
        headers.insert(
            "X-Frame-Options".parse::<HeaderName>().unwrap(),
            "DENY".parse().unwrap(),
        );
        headers.insert("strict-transport-security", "max-age=1".parse().unwrap());
        headers.insert("x-content-type-options", "nosniff".parse().unwrap());
        headers.insert("transfer-encoding", "chunked".parse().unwrap());
        headers.insert("content-type", "text/html".parse().unwrap());
        headers.insert("content-length", "42".parse().unwrap());

        sanitize_response_headers(&mut headers);

        assert_eq!(headers.len(), 2);
        assert!(headers.get("content-type").is_some());
        assert!(headers.get("content-length").is_some());
    }
}
