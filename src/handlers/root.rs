//! Root endpoint handler for the landing page.
//!
//! This module provides the `/` endpoint handler that lists all available
//! endpoints with short descriptions.

use axum::{extract::State, response::IntoResponse};
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");

    let version = env!("CARGO_PKG_VERSION");
    let uptime_secs = state.start_time.elapsed().as_secs();

    let body = format!(
        "deskflow-telemetry {version}\n\
         uptime: {uptime_secs}s\n\
         \n\
         Endpoints:\n\
         GET  /                 - this page\n\
         GET  /report           - generate and return a fresh telemetry report (JSON)\n\
         GET  /report/history   - the retained report history, oldest first (JSON)\n\
         GET  /stats            - detailed monitor and cache statistics (JSON)\n\
         GET  /dashboard        - plain-text telemetry dashboard\n\
         GET  /feeds/{{name}}     - one dashboard feed with stale-while-revalidate state (JSON)\n\
         GET  /metrics          - Prometheus metrics\n\
         POST /clear            - clear measurements, caches, and feed state\n\
         POST /clear/reports    - clear the report history\n\
         \n\
         Feeds: metrics, system_status, technician_ranking, new_tickets\n"
    );

    ([("Content-Type", "text/plain; charset=utf-8")], body)
}
