//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define proxy metrics (requests, latency, body rewrites)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `mirror_requests_total` (counter): requests by method, status, origin
//! - `mirror_request_duration_seconds` (histogram): latency distribution
//! - `mirror_body_rewrites_total` (counter): textual bodies rewritten
//! - `mirror_body_rewrite_bytes` (histogram): size of rewritten bodies
//! - `mirror_body_passthrough_total` (counter): bodies streamed untouched
//!
//! # Design Decisions
//! - Without an installed recorder every call is a no-op, so tests need no setup
//! - Labels for method, origin, status code

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request.
pub fn record_request(method: &str, status: u16, origin: &str, start: Instant) {
    let status = status.to_string();
    ::metrics::counter!(
        "mirror_requests_total",
        "method" => method.to_string(),
        "status" => status.clone(),
        "origin" => origin.to_string()
    )
    .increment(1);
    ::metrics::histogram!(
        "mirror_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status,
        "origin" => origin.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_body_rewrite(bytes: usize) {
    ::metrics::counter!("mirror_body_rewrites_total").increment(1);
    ::metrics::histogram!("mirror_body_rewrite_bytes").record(bytes as f64);
}

pub fn record_body_passthrough() {
    ::metrics::counter!("mirror_body_passthrough_total").increment(1);
}
