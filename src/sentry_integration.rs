//! Sentry error reporting for `wayfarer run`.
//!
//! Gateway faults are logged at `error` by the proxy boundary; the
//! `sentry-tracing` layer installed by [`crate::logging`] turns those into
//! Sentry events. This module only owns the client and its guard.

/// Returns `None` (reporting off) when the DSN does not parse.
#[must_use]
pub fn init(dsn: &str, environment: Option<&str>) -> Option<sentry::ClientInitGuard> {
    let dsn: sentry::types::Dsn = match dsn.parse() {
        Ok(dsn) => dsn,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unparseable SENTRY_DSN");
            return None;
        }
    };

    let guard = sentry::init(sentry::ClientOptions {
        dsn: Some(dsn),
        environment: environment.map(|env| env.to_owned().into()),
        release: sentry::release_name!(),
        attach_stacktrace: true,
        ..Default::default()
    });
    sentry::configure_scope(|scope| scope.set_tag("service", "gateway"));
    tracing::info!("sentry reporting enabled");
    Some(guard)
}
