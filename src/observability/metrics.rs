//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): relayed and failed requests by method, status
//! - `proxy_request_duration_seconds` (histogram): latency distribution
//! - `proxy_log_write_failures_total` (counter): records the log sink dropped
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Outcome label for a response relayed from the upstream.
pub const OUTCOME_RELAYED: &str = "relayed";
/// Outcome label for a transport failure answered with a 500.
pub const OUTCOME_ERROR: &str = "error";

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one completed proxy exchange.
pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    ::metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    ::metrics::histogram!(
        "proxy_request_duration_seconds",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a log line the sink failed to persist.
pub fn record_log_write_failure() {
    ::metrics::counter!("proxy_log_write_failures_total").increment(1);
}
