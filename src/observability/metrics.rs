//! Metrics collection and exposition.
//!
//! # Metrics
//! - `exchanges_logged_total` (counter): records emitted, by origin and direction
//! - `exchanges_excluded_total` (counter): exchanges skipped by path, by origin
//! - `redaction_body_parse_failures_total` (counter): bodies kept raw
//! - `outbound_requests_total` (counter): outbound calls, by status
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter is opt-in (`observability.metrics_enabled`)

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::http::exchange::Origin;
use crate::observability::sink::Direction;

/// Install the Prometheus recorder with its scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus exporter listening");
    Ok(())
}

pub fn record_exchange(origin: Origin, direction: Direction) {
    ::metrics::counter!(
        "exchanges_logged_total",
        "origin" => origin.as_str(),
        "direction" => direction.as_str()
    )
    .increment(1);
}

pub fn record_excluded(origin: Origin) {
    ::metrics::counter!("exchanges_excluded_total", "origin" => origin.as_str()).increment(1);
}

pub fn record_body_parse_failure(origin: Origin) {
    ::metrics::counter!("redaction_body_parse_failures_total", "origin" => origin.as_str())
        .increment(1);
}

/// `status` is the response code, or `"error"` when no response arrived.
pub fn record_outbound(status: &str) {
    ::metrics::counter!("outbound_requests_total", "status" => status.to_string()).increment(1);
}
