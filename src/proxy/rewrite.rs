//! Text rewriting of proxied HTML documents.
//!
//! Three passes run over the buffered document, in order:
//!
//! 1. [`rewrite_attributes`] routes relative `href`, `src`, `action` and
//!    `content` values through the gateway.
//! 2. [`rewrite_css_urls`] does the same for CSS `url(...)` references,
//!    in `<style>` blocks and `style` attributes alike.
//! 3. [`inject_base`] places `<base href="/proxy/<E>/">` right after the
//!    first `<head>` tag so anything the passes missed still resolves
//!    against the proxied origin.
//!
//! Only the reference value is replaced; quoting and surrounding text are
//! kept byte for byte.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Prefixes that mark a reference as absolute or not routable.
const NON_RELATIVE_PREFIXES: &[&str] = &[
    "http://",
    "https://",
    "//",
    "data:",
    "blob:",
    "javascript:",
    "mailto:",
    "tel:",
];

// Attribute name must follow whitespace so `data-src=` and `srcset=` are skipped.
static ATTRIBUTE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\s(href|src|action|content)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#,
    )
    .ok()
});

static CSS_URL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^\s"')]+))\s*\)"#).ok()
});

static HEAD_TAG: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)<head(?:\s[^>]*)?>").ok());

/// Per-request rewrite state: the encoded target exactly as it appeared in
/// the request path, and the gateway prefix derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteContext {
    encoded: String,
    prefix: String,
    base_path: String,
}

impl RewriteContext {
    #[must_use]
    pub fn new(encoded: &str) -> Self {
        let prefix = format!("/proxy/{encoded}");
        let base_path = format!("{prefix}/");
        Self {
            encoded: encoded.to_string(),
            prefix,
            base_path,
        }
    }

    #[must_use]
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// `/proxy/<E>`
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `/proxy/<E>/`
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Route a relative reference through the gateway.
    #[must_use]
    pub fn route(&self, value: &str) -> String {
        if value.starts_with('/') {
            format!("{}{value}", self.prefix)
        } else {
            format!("{}/{value}", self.prefix)
        }
    }

    fn is_routed(&self, value: &str) -> bool {
        value == self.prefix || value.starts_with(&self.base_path)
    }
}

/// A reference is relative unless it is absolute, scheme-relative, or uses
/// a non-HTTP scheme. Empty values and bare fragments are not rewritten.
#[must_use]
pub fn is_relative_reference(value: &str) -> bool {
    let value = value.trim_start();
    if value.is_empty() || value.starts_with('#') {
        return false;
    }
    !NON_RELATIVE_PREFIXES.iter().any(|prefix| {
        value
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

/// `content=` also carries plain text (`width=device-width`, `IE=edge`,
/// `noindex, nofollow`, `website`), so only single-token values that look
/// like a path are treated as references.
fn is_content_reference(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && !value.contains(|c: char| c.is_whitespace() || matches!(c, '=' | ';' | ','))
        && (value.contains('/') || value.contains('.'))
}

fn should_rewrite(value: &str, ctx: &RewriteContext) -> bool {
    is_relative_reference(value) && !ctx.is_routed(value.trim_start())
}

/// Replace the single value group that matched inside `caps`, keeping the
/// rest of the match untouched. Leading whitespace inside the value stays
/// in front of the routed reference.
fn splice_value(caps: &Captures<'_>, groups: &[usize], ctx: &RewriteContext) -> Option<String> {
    let whole = caps.get(0)?;
    let value = groups.iter().find_map(|&i| caps.get(i))?;
    let reference = value.as_str().trim_start();
    let start = value.end() - reference.len() - whole.start();
    let end = value.end() - whole.start();
    let text = whole.as_str();
    Some(format!(
        "{}{}{}",
        &text[..start],
        ctx.route(reference),
        &text[end..]
    ))
}

#[must_use]
pub fn rewrite_attributes<'a>(html: &'a str, ctx: &RewriteContext) -> Cow<'a, str> {
    let Some(pattern) = ATTRIBUTE.as_ref() else {
        return Cow::Borrowed(html);
    };
    pattern.replace_all(html, |caps: &Captures<'_>| {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        let Some(value) = [2, 3, 4].iter().find_map(|&i| caps.get(i)) else {
            return whole.to_string();
        };
        let is_content = caps
            .get(1)
            .is_some_and(|name| name.as_str().eq_ignore_ascii_case("content"));

        let value = value.as_str();
        if !should_rewrite(value, ctx) || (is_content && !is_content_reference(value)) {
            return whole.to_string();
        }
        splice_value(caps, &[2, 3, 4], ctx).unwrap_or_else(|| whole.to_string())
    })
}

#[must_use]
pub fn rewrite_css_urls<'a>(text: &'a str, ctx: &RewriteContext) -> Cow<'a, str> {
    let Some(pattern) = CSS_URL.as_ref() else {
        return Cow::Borrowed(text);
    };
    pattern.replace_all(text, |caps: &Captures<'_>| {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        let rewrite = [1, 2, 3]
            .iter()
            .find_map(|&i| caps.get(i))
            .is_some_and(|value| should_rewrite(value.as_str(), ctx));
        if rewrite {
            splice_value(caps, &[1, 2, 3], ctx).unwrap_or_else(|| whole.to_string())
        } else {
            whole.to_string()
        }
    })
}

/// Insert the base marker after the first `<head>` tag, keeping the tag's
/// own attributes. Documents without a `<head>` are returned unchanged.
#[must_use]
pub fn inject_base<'a>(html: &'a str, ctx: &RewriteContext) -> Cow<'a, str> {
    let Some(tag) = HEAD_TAG.as_ref().and_then(|pattern| pattern.find(html)) else {
        return Cow::Borrowed(html);
    };
    let marker = format!("<base href=\"{}\">", ctx.base_path());
    let mut out = String::with_capacity(html.len() + marker.len());
    out.push_str(&html[..tag.end()]);
    out.push_str(&marker);
    out.push_str(&html[tag.end()..]);
    Cow::Owned(out)
}

/// Run all passes over a decoded HTML document.
#[must_use]
pub fn rewrite_html(html: &str, ctx: &RewriteContext) -> String {
    let attributes = rewrite_attributes(html, ctx);
    let urls = rewrite_css_urls(&attributes, ctx);
    inject_base(&urls, ctx).into_owned()
}

/// Route a relative `Location` header through the gateway.
#[must_use]
pub fn rewrite_location(location: &str, ctx: &RewriteContext) -> Option<String> {
    let location = location.trim_start();
    should_rewrite(location, ctx).then(|| ctx.route(location))
}
