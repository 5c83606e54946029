//! Target resolution: `/proxy/<segment>` to an upstream origin.
//!
//! The segment is percent-decoded, then base64-decoded. Both the standard
//! and URL-safe alphabets are accepted with or without padding, since
//! browsers produce the former (`btoa`) and [`encode`] produces the latter.
//!
//! The segment ends at the first `/` of the request path, so a standard
//! alphabet segment that contains `/` only arrives intact when the client
//! percent-encodes it as `%2F`. [`encode`] never emits `/`.

use std::fmt;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

use crate::error::GatewayError;

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_encode_padding(false)
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);

const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// An absolute upstream origin, always carrying an `http://` or `https://`
/// scheme. Nothing past the scheme is validated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin(String);

impl Origin {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join the origin with the path (and query) the client asked for.
    #[must_use]
    pub fn join(&self, path_and_query: &str) -> String {
        let base = self.0.trim_end_matches('/');
        if path_and_query.is_empty() {
            format!("{base}/")
        } else if path_and_query.starts_with('/') {
            format!("{base}{path_and_query}")
        } else {
            format!("{base}/{path_and_query}")
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn resolve(segment: &str) -> Result<Origin, GatewayError> {
    if segment.is_empty() {
        return Err(GatewayError::MissingTarget);
    }

    let unescaped = urlencoding::decode(segment).map_err(|e| GatewayError::InvalidEncoding {
        reason: format!("percent-decoding failed: {e}"),
    })?;

    let raw = decode_base64(unescaped.trim())?;
    let decoded = String::from_utf8(raw).map_err(|_| GatewayError::InvalidEncoding {
        reason: "decoded target is not valid UTF-8".into(),
    })?;

    let decoded = decoded.trim();
    if decoded.is_empty() {
        return Err(GatewayError::MissingTarget);
    }

    Ok(Origin(with_default_scheme(decoded)))
}

/// Produce the path segment a client should use to reach `origin`.
#[must_use]
pub fn encode(origin: &str) -> String {
    URL_SAFE_LENIENT.encode(origin.trim())
}

fn decode_base64(input: &str) -> Result<Vec<u8>, GatewayError> {
    STANDARD_LENIENT
        .decode(input)
        .or_else(|_| URL_SAFE_LENIENT.decode(input))
        .map_err(|e| GatewayError::InvalidEncoding {
            reason: e.to_string(),
        })
}

fn with_default_scheme(target: &str) -> String {
    if has_prefix_ignore_case(target, "http://") || has_prefix_ignore_case(target, "https://") {
        target.to_string()
    } else {
        format!("https://{target}")
    }
}

fn has_prefix_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
