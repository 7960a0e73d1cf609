//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lab_requests_total` (counter): requests by method, status, route
//! - `lab_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - Pattern string as the route label, "none" for unmatched requests
//! - Exporter install failure is logged, never fatal

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "failed to install metrics exporter"),
    }
}

/// Record one dispatched request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    let route = route.to_string();

    metrics::counter!(
        "lab_requests_total",
        "method" => method.clone(),
        "status" => status.clone(),
        "route" => route.clone(),
    )
    .increment(1);
    metrics::histogram!(
        "lab_request_duration_seconds",
        "method" => method,
        "status" => status,
        "route" => route,
    )
    .record(start.elapsed().as_secs_f64());
}
