//! Metrics collection and exposition.
//!
//! # Metrics
//! - `auth_requests_total` (counter): requests by route, status
//! - `auth_request_duration_seconds` (histogram): latency by route
//! - `auth_guard_rejections_total` (counter): redirects/rejections by guard
//! - `auth_rate_limited_total` (counter): throttled requests by route
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed (tests stay silent)
//! - Prometheus exporter listens on its own address

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    counter!(
        "auth_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("auth_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_guard_rejection(guard: &str) {
    counter!("auth_guard_rejections_total", "guard" => guard.to_string()).increment(1);
}

pub fn record_rate_limited(route: &str) {
    counter!("auth_rate_limited_total", "route" => route.to_string()).increment(1);
}
