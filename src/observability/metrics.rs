//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define dispatch metrics (outcomes, latency, route count)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `router_dispatch_total` (counter): dispatches by outcome
//! - `router_dispatch_duration_seconds` (histogram): time spent in dispatch
//! - `router_routes` (gauge): routes in the published router
//!
//! # Design Decisions
//! - Recorded by the HTTP front, never inside the matcher
//! - Without an installed recorder the macros are no-ops

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_dispatch(outcome: &'static str, start: Instant) {
    ::metrics::counter!("router_dispatch_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("router_dispatch_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_route_count(count: usize) {
    ::metrics::gauge!("router_routes").set(count as f64);
}
