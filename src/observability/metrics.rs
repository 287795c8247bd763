//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rewrite_body_responses_total` (counter): responses handled, by `outcome`
//!   (`rewritten`, `passthrough_not_text`, `passthrough_encoding`,
//!   `decode_failed`, `encode_failed`)

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::http::RewriteOutcome;

pub const RESPONSES_TOTAL: &str = "rewrite_body_responses_total";

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_outcome(outcome: &RewriteOutcome) {
    metrics::counter!(RESPONSES_TOTAL, "outcome" => outcome.as_str()).increment(1);
}
