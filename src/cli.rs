//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, encode, decode, health), and their associated
//! argument structs. Every valued flag has an environment variable
//! equivalent for container deployments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::middleware::DEFAULT_MAX_BODY;
use crate::proxy::user_agent::DEFAULT_USER_AGENT;

#[derive(Parser)]
#[command(
    name = "wayfarer",
    version,
    about = "Forwarding HTTP gateway with HTML rewriting",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        wayfarer run                         Start on 0.0.0.0:3000\n  \
        wayfarer encode example.com          Print the gateway path for a site\n  \
        wayfarer health                      Check a running instance"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway
    Run(Box<RunArgs>),

    /// Print the /proxy/ path for a target URL
    Encode(EncodeArgs),

    /// Resolve an encoded segment to its upstream origin
    Decode(DecodeArgs),

    /// Check health of a running instance
    Health(HealthArgs),
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        wayfarer run                                   Defaults\n  \
        wayfarer run -p 8080 --pretty                  Local dev mode\n  \
        wayfarer run --static-dir ./public             Serve a custom landing page\n  \
        wayfarer run --rotate-user-agent --timeout 30000")]
pub struct RunArgs {
    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Directory served at `/` and for unmatched paths
    #[arg(long, env = "STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,

    // -- Observability --
    /// Sentry DSN (enables error tracking)
    #[cfg(feature = "sentry-integration")]
    #[arg(long, env = "SENTRY_DSN", help_heading = "Observability")]
    pub sentry_dsn: Option<String>,

    /// Sentry environment tag
    #[cfg(feature = "sentry-integration")]
    #[arg(long, env = "SENTRY_ENVIRONMENT", help_heading = "Observability")]
    pub sentry_environment: Option<String>,

    // -- Upstream --
    /// User-Agent sent to upstreams
    #[arg(
        long,
        env = "USER_AGENT",
        default_value = DEFAULT_USER_AGENT,
        help_heading = "Upstream"
    )]
    pub user_agent: String,

    /// Pick a random browser User-Agent per request (overrides --user-agent)
    #[arg(long, help_heading = "Upstream")]
    pub rotate_user_agent: bool,

    // -- Tuning --
    /// Upstream timeout in milliseconds
    #[arg(
        long,
        env = "REQUEST_TIMEOUT_MS",
        default_value_t = 15_000,
        help_heading = "Tuning"
    )]
    pub timeout: u64,

    /// Max request body size in bytes
    #[arg(
        long,
        env = "MAX_BODY_SIZE",
        default_value_t = DEFAULT_MAX_BODY,
        help_heading = "Tuning"
    )]
    pub max_body: usize,

    /// Disable the permissive CORS filter
    #[arg(long, help_heading = "Tuning")]
    pub no_cors: bool,

    /// Disable gzip compression of responses
    #[arg(long, help_heading = "Tuning")]
    pub no_compression: bool,
}

#[derive(Args)]
pub struct EncodeArgs {
    /// Target URL or bare hostname
    pub url: String,
}

#[derive(Args)]
pub struct DecodeArgs {
    /// Encoded segment, as it appears after /proxy/
    pub segment: String,
}

#[derive(Args)]
pub struct HealthArgs {
    /// URL of the running instance
    #[arg(default_value = "http://localhost:3000")]
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}
