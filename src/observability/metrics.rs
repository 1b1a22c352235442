//! Metrics collection and exposition.
//!
//! # Metrics
//! - `graphql_requests_total` (counter): requests by transport, status
//! - `graphql_request_duration_seconds` (histogram): latency by transport
//! - `graphql_uploads_total` (counter): attached uploads by storage strategy
//! - `graphql_panics_recovered_total` (counter): panics caught at the boundary
//!
//! # Design Decisions
//! - Macros are no-ops until a recorder is installed, so tests need no setup
//! - Prometheus exporter is optional and bound to its own address

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request.
pub fn record_request(transport: &'static str, status: u16, start: Instant) {
    counter!(
        "graphql_requests_total",
        "transport" => transport,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("graphql_request_duration_seconds", "transport" => transport)
        .record(start.elapsed().as_secs_f64());
}

/// Record one upload attached to a destination path.
pub fn record_upload(strategy: &'static str) {
    counter!("graphql_uploads_total", "strategy" => strategy).increment(1);
}

/// Record a panic converted into an error response.
pub fn record_panic() {
    counter!("graphql_panics_recovered_total").increment(1);
}
