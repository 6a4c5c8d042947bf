//! Report endpoint handlers.
//!
//! `/report` generates a fresh telemetry report, merging the upstream
//! performance payload when it is available, and hands the report to the
//! analytics exporter. `/report/history` returns the retained ring of past
//! reports.

use axum::{extract::State, Json};
use tracing::{debug, instrument};

use deskflow_telemetry::Report;

use crate::state::SharedState;

/// Handler for the `/report` endpoint.
#[instrument(skip(state))]
pub async fn report_handler(State(state): State<SharedState>) -> Json<Report> {
    debug!("Processing /report request");

    // The upstream payload is opportunistic: any failure already collapsed
    // to None inside the client, and the summary stays local-only.
    let extras = match &state.upstream {
        Some(client) => client.summary_extras().await,
        None => None,
    };

    let report = state.monitor.generate_report(extras.as_ref());
    state.exporter.export(&report);
    state
        .reports_retained
        .set(state.monitor.report_history().len() as f64);

    Json(report)
}

/// Handler for the `/report/history` endpoint.
#[instrument(skip(state))]
pub async fn report_history_handler(State(state): State<SharedState>) -> Json<Vec<Report>> {
    debug!("Processing /report/history request");
    Json(state.monitor.report_history())
}
