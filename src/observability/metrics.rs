//! Metrics collection and exposition.
//!
//! # Metrics
//! - `frontend_requests_total` (counter): requests by mode and status
//! - `frontend_request_duration_seconds` (histogram): latency by mode
//! - `frontend_cache_lookups_total` (counter): memo lookups by outcome
//!   (`hit`, `coalesced`, `miss`)
//! - `frontend_rewrites_total` (counter): rewritten bodies by source
//!   (`proxy`, `static`)
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - The Prometheus exporter is only installed when enabled in config

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

/// Record a served request.
pub fn record_request(mode: &'static str, status: u16, start: Instant) {
    ::metrics::counter!(
        "frontend_requests_total",
        "mode" => mode,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("frontend_request_duration_seconds", "mode" => mode)
        .record(start.elapsed().as_secs_f64());
}

/// Record the outcome of a memo cache lookup.
pub fn record_cache_lookup(outcome: &'static str) {
    ::metrics::counter!("frontend_cache_lookups_total", "outcome" => outcome).increment(1);
}

/// Record a document body passing through the rewriter.
pub fn record_rewrite(source: &'static str) {
    ::metrics::counter!("frontend_rewrites_total", "source" => source).increment(1);
}
