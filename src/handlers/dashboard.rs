//! Plain-text dashboard endpoint handler.
//!
//! This module provides the `/dashboard` endpoint that renders the
//! telemetry dashboard table for terminals and simple monitoring pages.

use axum::{extract::State, response::IntoResponse};
use tracing::{debug, instrument};

use deskflow_telemetry::reporting::render_dashboard;

use crate::state::SharedState;

/// Handler for the `/dashboard` endpoint.
#[instrument(skip(state))]
pub async fn dashboard_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /dashboard request");

    let detailed = state.monitor.detailed_stats();
    let cache = state.caches.aggregate_stats();
    let history = state.monitor.report_history();
    let uptime_secs = state.start_time.elapsed().as_secs();

    let table = render_dashboard(&detailed, &cache, history.last(), uptime_secs);

    ([("Content-Type", "text/plain; charset=utf-8")], table)
}
