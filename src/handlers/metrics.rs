//! Metrics endpoint handler for Prometheus scraping.
//!
//! This module provides the `/metrics` endpoint handler that refreshes the
//! telemetry gauges from current cache and monitor state, then encodes the
//! registry in Prometheus text format.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use prometheus::{Encoder, TextEncoder};
use tracing::{debug, error, instrument};

use crate::state::SharedState;

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    EncodingFailed,
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode metrics",
        )
            .into_response()
    }
}

/// Handler for the `/metrics` endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler(State(state): State<SharedState>) -> Result<String, MetricsError> {
    debug!("Processing /metrics request");

    // Refresh gauges from the current cache/monitor population.
    let cache_stats = state.caches.aggregate_stats();
    state.cache_hit_rate.set(cache_stats.overall_hit_rate);
    state.cache_live_entries.set(cache_stats.total_size as f64);
    state
        .reports_retained
        .set(state.monitor.report_history().len() as f64);

    let encoder = TextEncoder::new();
    let metric_families = state.registry.gather();
    let mut buffer = Vec::with_capacity(4096);

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return Err(MetricsError::EncodingFailed);
    }

    String::from_utf8(buffer).map_err(|e| {
        error!("Metrics buffer is not valid UTF-8: {}", e);
        MetricsError::EncodingFailed
    })
}
