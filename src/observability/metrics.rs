//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_lookups_total` (counter): lookups by `outcome`
//!   (`matched`, `unmatched`, `error`)
//! - `router_routes` (gauge): routes in the table a `SharedRouter` last
//!   published

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Starts the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_lookup(outcome: &'static str) {
    metrics::counter!("router_lookups_total", "outcome" => outcome).increment(1);
}

pub fn record_routes(count: usize) {
    metrics::gauge!("router_routes").set(count as f64);
}
