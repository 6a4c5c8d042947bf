//! Feed endpoint handler.
//!
//! This module provides the `/feeds/{name}` endpoint that serves one
//! dashboard dataset through the cache and the stale-while-revalidate
//! controller.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use deskflow_telemetry::swr::{FeedPhase, FeedView};

use crate::feeds::{read_feed, FeedKind};
use crate::state::SharedState;

/// Response payload for one feed read.
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub feed: &'static str,
    pub phase: FeedPhase,
    pub updating: bool,
    pub view: FeedView<Value>,
}

/// Handler for the `/feeds/{name}` endpoint.
#[instrument(skip(state))]
pub async fn feed_handler(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    debug!("Processing /feeds/{} request", name);

    let Some(kind) = FeedKind::from_name(&name) else {
        return (
            StatusCode::NOT_FOUND,
            format!("unknown feed '{}'", name),
        )
            .into_response();
    };

    let view = read_feed(&state, kind).await;
    let (phase, updating) = {
        let controller = state.feeds.controller(kind).read().await;
        (controller.phase(), controller.is_updating())
    };

    Json(FeedResponse {
        feed: kind.name(),
        phase,
        updating,
        view,
    })
    .into_response()
}
