//! Structured logging setup using the `tracing` ecosystem.
//!
//! Configures a `tracing-subscriber` with either JSON output (for
//! production) or pretty-printed output (for TTY / local dev). Format
//! is auto-detected from the terminal but can be forced via `--json`
//! or `--pretty`. Connection-level chatter from the HTTP client and TLS
//! stack is capped at `warn` so per-request gateway logs stay readable.

use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::LogLevel;

const NOISY_TARGETS: &[&str] = &["hyper_util", "hyper_rustls", "rustls"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[must_use]
pub fn resolve_format(pretty: bool, json: bool) -> LogFormat {
    if json {
        LogFormat::Json
    } else if pretty || std::io::IsTerminal::is_terminal(&std::io::stdout()) {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    }
}

#[must_use]
pub fn filter_for(level: &LogLevel) -> Targets {
    let tracing_level = level.to_tracing_level();
    let capped = if tracing_level > Level::WARN {
        Level::WARN
    } else {
        tracing_level
    };
    NOISY_TARGETS.iter().fold(
        Targets::new().with_default(tracing_level),
        |filter, target| filter.with_target(*target, capped),
    )
}

pub fn init(level: &LogLevel, format: LogFormat) {
    let filter = filter_for(level);

    #[cfg(feature = "sentry-integration")]
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(sentry_tracing::layer());
    #[cfg(not(feature = "sentry-integration"))]
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => {
            registry
                .with(fmt::layer().json().with_target(false))
                .init();
        }
        LogFormat::Pretty => {
            registry.with(fmt::layer().pretty()).init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_wins() {
        assert_eq!(resolve_format(false, true), LogFormat::Json);
    }

    #[test]
    fn pretty_flag_forces_pretty() {
        assert_eq!(resolve_format(true, false), LogFormat::Pretty);
    }

    #[test]
    fn client_targets_are_capped_at_warn() {
        let filter = filter_for(&LogLevel::Debug);
        assert!(filter.would_enable("wayfarer::proxy", &Level::DEBUG));
        assert!(!filter.would_enable("hyper_util::client", &Level::DEBUG));
        assert!(filter.would_enable("hyper_util::client", &Level::WARN));
    }

    #[test]
    fn stricter_levels_are_not_loosened() {
        let filter = filter_for(&LogLevel::Error);
        assert!(!filter.would_enable("rustls", &Level::WARN));
    }
}
