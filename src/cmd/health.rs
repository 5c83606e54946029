//! `wayfarer health` — query `/health` on a running gateway.
//!
//! Uses the same pooled client the gateway forwards with, so `https://`
//! instances work too. Prints a short report, or the raw JSON with `--json`.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};

use crate::cli::HealthArgs;
use crate::error::WayfarerError;
use crate::health::HealthResponse;
use crate::server;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn execute(args: HealthArgs) -> Result<(), WayfarerError> {
    let body = fetch(&args.url).await?;

    if args.json {
        println!("{}", String::from_utf8_lossy(&body));
        return Ok(());
    }

    match serde_json::from_slice::<HealthResponse>(&body) {
        Ok(health) => print!("{}", report(&args.url, &health)),
        Err(e) => {
            eprintln!("unrecognized /health payload ({e}), raw body follows");
            println!("{}", String::from_utf8_lossy(&body));
        }
    }
    Ok(())
}

async fn fetch(base: &str) -> Result<Bytes, WayfarerError> {
    let uri: hyper::Uri = format!("{}/health", base.trim_end_matches('/'))
        .parse()
        .map_err(|e: hyper::http::uri::InvalidUri| WayfarerError::UriParse {
            source: Box::new(e),
        })?;
    let request = hyper::Request::get(uri)
        .body(Full::new(Bytes::new()))
        .map_err(|e| WayfarerError::HttpRequest {
            source: Box::new(e),
        })?;

    let client = server::build_http_client();
    let response = tokio::time::timeout(PROBE_TIMEOUT, client.request(request))
        .await
        .map_err(|_| WayfarerError::HttpRequest {
            source: format!("no answer within {}s", PROBE_TIMEOUT.as_secs()).into(),
        })?
        .map_err(|e| WayfarerError::HttpRequest {
            source: Box::new(e),
        })?;

    let (parts, body) = response.into_parts();
    if !parts.status.is_success() {
        return Err(WayfarerError::HealthCheckFailed(parts.status));
    }
    Ok(body
        .collect()
        .await
        .map_err(|e| WayfarerError::HttpRequest {
            source: Box::new(e),
        })?
        .to_bytes())
}

fn report(url: &str, health: &HealthResponse) -> String {
    let stats = &health.stats;
    let handled = stats.requests_forwarded + stats.requests_failed;
    let failure_rate = if handled == 0 {
        0.0
    } else {
        stats.requests_failed as f64 * 100.0 / handled as f64
    };
    format!(
        "wayfarer {version} at {url}: {status}, up {uptime}\n  \
         upstream timeout  {timeout}ms\n  \
         forwarded         {forwarded} ({rewritten} HTML documents rewritten)\n  \
         failed            {failed} ({failure_rate:.1}%)\n",
        version = health.version,
        status = health.status,
        uptime = format_uptime(health.uptime_seconds),
        timeout = health.upstream_timeout_ms,
        forwarded = stats.requests_forwarded,
        rewritten = stats.documents_rewritten,
        failed = stats.requests_failed,
    )
}

fn format_uptime(seconds: u64) -> String {
    match (seconds / 86_400, seconds % 86_400 / 3600, seconds % 3600 / 60) {
        (0, 0, 0) => format!("{seconds}s"),
        (0, 0, m) => format!("{m}m {}s", seconds % 60),
        (0, h, m) => format!("{h}h {m}m"),
        (d, h, _) => format!("{d}d {h}h"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::StatsResponse;

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(5), "5s");
        assert_eq!(format_uptime(65), "1m 5s");
        assert_eq!(format_uptime(3725), "1h 2m");
        assert_eq!(format_uptime(90_000), "1d 1h");
    }

    #[test]
    fn report_shows_rewrites_and_failure_rate() {
        let health = HealthResponse {
            status: "healthy".into(),
            version: "0.1.0".into(),
            uptime_seconds: 42,
            upstream_timeout_ms: 15_000,
            stats: StatsResponse {
                requests_forwarded: 3,
                documents_rewritten: 2,
                requests_failed: 1,
            },
        };
        let text = report("http://localhost:3000", &health);
        assert!(text.starts_with("wayfarer 0.1.0 at http://localhost:3000: healthy, up 42s\n"));
        assert!(text.contains("upstream timeout  15000ms"));
        assert!(text.contains("forwarded         3 (2 HTML documents rewritten)"));
        assert!(text.contains("failed            1 (25.0%)"));
    }
}
