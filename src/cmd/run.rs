//! `wayfarer run` — start the gateway.
//!
//! Validates settings, initializes logging, builds the shared state and
//! filter-wrapped router, and serves until Ctrl+C / SIGTERM.

use std::sync::Arc;

use crate::cli::RunArgs;
use crate::config::GatewayConfig;
use crate::error::WayfarerError;
use crate::logging;
use crate::server::{self, AppState};

pub async fn execute(args: RunArgs) -> Result<(), WayfarerError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    #[cfg(feature = "sentry-integration")]
    let _sentry_guard = args
        .sentry_dsn
        .as_ref()
        .and_then(|dsn| {
            crate::sentry_integration::init(dsn, args.sentry_environment.as_deref())
        });

    let config = GatewayConfig::from_args(&args)?;

    let state = Arc::new(AppState::new(server::build_http_client(), config.policy()));
    let router = server::build_router(state, &config.router_options());

    let listener = tokio::net::TcpListener::bind(config.listen).await?;

    tracing::info!(
        addr = %config.listen,
        timeout_ms = u64::try_from(config.timeout.as_millis()).unwrap_or(u64::MAX),
        rotate_user_agent = matches!(config.user_agent, crate::config::UserAgentMode::Rotating),
        cors = config.filters.cors,
        compression = config.filters.compression,
        "wayfarer started"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    tracing::info!("wayfarer stopped");
    Ok(())
}
