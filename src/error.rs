//! Unified error types for Wayfarer.
//!
//! [`GatewayError`] is the per-request taxonomy: every variant maps to the
//! HTTP status the gateway answers with, and renders itself as a short
//! plain-text response. [`WayfarerError`] covers process-level failures
//! (startup, CLI commands) and [`ValidationError`] reports bad settings
//! with a hint toward a fix.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}: {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{e}");
    }
    buf
}

/// Faults raised while serving a single `/proxy/...` request.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("missing target: expected /proxy/<base64-encoded-url>/")]
    MissingTarget,

    #[error("invalid target encoding: {reason}")]
    InvalidEncoding { reason: String },

    #[error("invalid upstream URL '{target}': {reason}")]
    InvalidUpstream { target: String, reason: String },

    #[error("upstream {target} unreachable: {source}")]
    UpstreamUnreachable {
        target: String,
        #[source]
        source: BoxError,
    },

    #[error("upstream {target} did not respond within {timeout_ms}ms")]
    UpstreamTimeout { target: String, timeout_ms: u128 },

    #[error("failed to read body from upstream {target}: {source}")]
    UpstreamBody {
        target: String,
        #[source]
        source: BoxError,
    },

    #[error("internal gateway error: {0}")]
    Internal(String),
}

impl GatewayError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingTarget | Self::InvalidEncoding { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidUpstream { .. }
            | Self::UpstreamUnreachable { .. }
            | Self::UpstreamBody { .. } => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let reason = status.canonical_reason().unwrap_or("Error");
        (status, format!("{} {reason}: {self}\n", status.as_u16())).into_response()
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WayfarerError {
    #[error("Invalid settings:\n{}", format_errors(.errors))]
    InvalidSettings { errors: Vec<ValidationError> },

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: BoxError,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: BoxError,
    },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(hyper::StatusCode),

    #[error("{0}")]
    Target(#[from] GatewayError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_faults_are_bad_request() {
        assert_eq!(GatewayError::MissingTarget.status(), StatusCode::BAD_REQUEST);
        let err = GatewayError::InvalidEncoding {
            reason: "bad".into(),
        };
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn network_faults_are_gateway_errors() {
        let err = GatewayError::UpstreamUnreachable {
            target: "https://example.invalid/".into(),
            source: "connection refused".into(),
        };
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

        let err = GatewayError::UpstreamTimeout {
            target: "https://example.invalid/".into(),
            timeout_ms: 10,
        };
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn internal_fault_is_500() {
        let resp = GatewayError::Internal("boom".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_error_display_includes_suggestion() {
        let err = ValidationError {
            field: "timeout".into(),
            message: "must be greater than zero".into(),
            suggestion: Some("try 15000".into()),
        };
        assert_eq!(
            err.to_string(),
            "  timeout: must be greater than zero (try 15000)"
        );
    }
}
