//! Runtime settings assembled from the `run` arguments.
//!
//! [`GatewayConfig::from_args`] validates every setting up front and
//! reports all problems at once as [`ValidationError`]s, each with a hint
//! toward a fix, instead of failing on the first one.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;

use crate::cli::RunArgs;
use crate::error::{ValidationError, WayfarerError};
use crate::middleware::FilterConfig;
use crate::proxy::forward::ForwardPolicy;
use crate::proxy::user_agent::{FixedUserAgent, RotatingUserAgent, UserAgentStrategy};
use crate::server::RouterOptions;

#[derive(Debug, Clone)]
pub enum UserAgentMode {
    Fixed(String),
    Rotating,
}

impl UserAgentMode {
    #[must_use]
    pub fn strategy(&self) -> Arc<dyn UserAgentStrategy> {
        match self {
            Self::Fixed(value) => Arc::new(FixedUserAgent::new(value.clone())),
            Self::Rotating => Arc::new(RotatingUserAgent::browsers()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub listen: SocketAddr,
    pub timeout: Duration,
    pub user_agent: UserAgentMode,
    pub static_dir: Option<PathBuf>,
    pub filters: FilterConfig,
}

impl GatewayConfig {
    pub fn from_args(args: &RunArgs) -> Result<Self, WayfarerError> {
        let mut errors = Vec::new();

        let listen = match format!("{}:{}", args.host, args.port).parse::<SocketAddr>() {
            Ok(addr) => Some(addr),
            Err(_) => {
                errors.push(ValidationError {
                    field: "host".into(),
                    message: format!("'{}' is not a valid IP address", args.host),
                    suggestion: Some("use 0.0.0.0 or 127.0.0.1".into()),
                });
                None
            }
        };

        if args.timeout == 0 {
            errors.push(ValidationError {
                field: "timeout".into(),
                message: "must be greater than zero".into(),
                suggestion: Some("the default is 15000 ms".into()),
            });
        }

        if args.max_body == 0 {
            errors.push(ValidationError {
                field: "max-body".into(),
                message: "must be greater than zero".into(),
                suggestion: None,
            });
        }

        let user_agent = if args.rotate_user_agent {
            UserAgentMode::Rotating
        } else {
            if let Err(message) = validate_user_agent(&args.user_agent) {
                errors.push(ValidationError {
                    field: "user-agent".into(),
                    message,
                    suggestion: Some("use --rotate-user-agent for browser defaults".into()),
                });
            }
            UserAgentMode::Fixed(args.user_agent.clone())
        };

        if let Some(ref dir) = args.static_dir {
            if !dir.is_dir() {
                errors.push(ValidationError {
                    field: "static-dir".into(),
                    message: format!("'{}' is not a directory", dir.display()),
                    suggestion: None,
                });
            }
        }

        match listen {
            Some(listen) if errors.is_empty() => Ok(Self {
                listen,
                timeout: Duration::from_millis(args.timeout),
                user_agent,
                static_dir: args.static_dir.clone(),
                filters: FilterConfig {
                    max_body: args.max_body,
                    cors: !args.no_cors,
                    compression: !args.no_compression,
                },
            }),
            _ => Err(WayfarerError::InvalidSettings { errors }),
        }
    }

    #[must_use]
    pub fn policy(&self) -> ForwardPolicy {
        ForwardPolicy {
            timeout: self.timeout,
            user_agent: self.user_agent.strategy(),
        }
    }

    #[must_use]
    pub fn router_options(&self) -> RouterOptions {
        RouterOptions {
            filters: self.filters.clone(),
            static_dir: self.static_dir.clone(),
        }
    }
}

/// A user agent must be non-empty and usable as a header value.
pub fn validate_user_agent(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("cannot be empty".into());
    }
    HeaderValue::from_str(value)
        .map(|_| ())
        .map_err(|_| "contains characters not allowed in a header".into())
}
