//! Manual reset endpoint handlers.
//!
//! These back the reset buttons on the monitoring UI: `/clear` drops live
//! measurements, cached entries, and feed state; `/clear/reports` drops only
//! the retained report history.

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::state::SharedState;

/// Handler for the `POST /clear` endpoint.
#[instrument(skip(state))]
pub async fn clear_handler(State(state): State<SharedState>) -> Json<Value> {
    info!("Manual clear requested: measurements, caches, and feeds");

    state.monitor.clear();
    state.caches.clear_all();
    state.feeds.clear_all().await;

    Json(json!({ "cleared": ["measurements", "caches", "feeds"] }))
}

/// Handler for the `POST /clear/reports` endpoint.
#[instrument(skip(state))]
pub async fn clear_reports_handler(State(state): State<SharedState>) -> Json<Value> {
    info!("Manual clear requested: report history");

    state.monitor.clear_reports();
    state.reports_retained.set(0.0);

    Json(json!({ "cleared": ["reports"] }))
}
