//! Splitting of `/proxy/<segment>/<rest>` request paths.
//!
//! The segment is taken verbatim (still percent-encoded) so the rewrite
//! prefix matches what the browser sent; the rest keeps its leading `/`
//! and is what the upstream sees.

/// A request path under `/proxy`, split at the first boundary after the
/// encoded target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyPath<'a> {
    pub segment: &'a str,
    pub rest: &'a str,
}

/// Returns `None` when `path` is not under `/proxy`. An empty segment is
/// returned as-is; the resolver rejects it.
#[must_use]
pub fn split_proxy_path(path: &str) -> Option<ProxyPath<'_>> {
    let after = path.strip_prefix("/proxy")?;
    if after.is_empty() {
        return Some(ProxyPath {
            segment: "",
            rest: "",
        });
    }
    let after = after.strip_prefix('/')?;
    let (segment, rest) = after
        .find('/')
        .map_or((after, ""), |idx| (&after[..idx], &after[idx..]));
    Some(ProxyPath { segment, rest })
}

/// Path and query forwarded upstream.
#[must_use]
pub fn upstream_path_and_query(rest: &str, query: Option<&str>) -> String {
    let path = if rest.is_empty() { "/" } else { rest };
    match query {
        Some(q) if !q.is_empty() => format!("{path}?{q}"),
        _ => path.to_string(),
    }
}
