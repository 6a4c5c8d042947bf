//! Dashboard feed definitions and refresh logic.
//!
//! This module defines the four dashboard datasets and the refresh function
//! that can be triggered both by the background periodic task and on-demand
//! by a cache-missing feed read. Fetched payloads flow through the
//! performance monitor, the priority cache, and the per-feed
//! stale-while-revalidate controller.

use ahash::AHashMap as HashMap;
use chrono::Utc;
use rand::Rng;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

use deskflow_telemetry::swr::{FeedController, FeedView};
use deskflow_telemetry::{MeasureCategory, Priority};

use crate::state::SharedState;

/// Cache key under which each feed stores its current payload.
const CACHE_KEY: &str = "current";

/// How long a feed stays in the Fresh phase before settling back to Cached.
/// Keeps the ranking table's "just updated" indicator from flickering.
const SETTLE_WINDOW: Duration = Duration::from_millis(750);

/// The dashboard datasets served by this sidecar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    /// Ticket volume and resolution metrics for the overview cards.
    Metrics,
    /// Backend/system component status for the status banner.
    SystemStatus,
    /// Technician leaderboard for the ranking table.
    TechnicianRanking,
    /// The most recent open tickets for the notification list.
    NewTickets,
}

impl FeedKind {
    pub const ALL: [FeedKind; 4] = [
        FeedKind::Metrics,
        FeedKind::SystemStatus,
        FeedKind::TechnicianRanking,
        FeedKind::NewTickets,
    ];

    /// Store name in the cache manager, also the URL segment in `/feeds/{name}`.
    pub fn name(&self) -> &'static str {
        match self {
            FeedKind::Metrics => "metrics",
            FeedKind::SystemStatus => "system_status",
            FeedKind::TechnicianRanking => "technician_ranking",
            FeedKind::NewTickets => "new_tickets",
        }
    }

    pub fn from_name(name: &str) -> Option<FeedKind> {
        FeedKind::ALL.iter().copied().find(|k| k.name() == name)
    }

    /// Volatility class: how costly staleness is for this dataset.
    pub fn priority(&self) -> Priority {
        match self {
            FeedKind::NewTickets => Priority::High,
            FeedKind::Metrics => Priority::Medium,
            FeedKind::TechnicianRanking => Priority::Medium,
            FeedKind::SystemStatus => Priority::Low,
        }
    }

    /// Ticket-backend endpoint serving this feed.
    pub fn endpoint(&self) -> &'static str {
        match self {
            FeedKind::Metrics => "/api/dashboard/metrics",
            FeedKind::SystemStatus => "/api/system/status",
            FeedKind::TechnicianRanking => "/api/technicians/ranking",
            FeedKind::NewTickets => "/api/tickets/new",
        }
    }

    fn fetch_measure_name(&self) -> String {
        format!("api-{}", self.name())
    }

    fn shape_measure_name(&self) -> String {
        format!("filter-{}", self.name())
    }
}

/// One stale-while-revalidate controller per feed.
pub struct FeedStates {
    controllers: HashMap<FeedKind, RwLock<FeedController<Value>>>,
}

impl FeedStates {
    pub fn new() -> Self {
        let mut controllers = HashMap::new();
        for kind in FeedKind::ALL {
            controllers.insert(kind, RwLock::new(FeedController::new()));
        }
        Self { controllers }
    }

    pub fn controller(&self, kind: FeedKind) -> &RwLock<FeedController<Value>> {
        // All four controllers are inserted at construction time.
        &self.controllers[&kind]
    }

    pub async fn view(&self, kind: FeedKind) -> FeedView<Value> {
        self.controller(kind).read().await.view()
    }

    pub async fn clear_all(&self) {
        for kind in FeedKind::ALL {
            self.controller(kind).write().await.clear();
        }
    }
}

impl Default for FeedStates {
    fn default() -> Self {
        Self::new()
    }
}

/// Refreshes one feed: fetch, shape, cache, and publish to the controller.
///
/// The fetch error is propagated to the caller unchanged after the
/// controller has been notified; retry policy stays with the caller.
#[instrument(skip(state))]
pub async fn refresh_feed(state: &SharedState, kind: FeedKind) -> anyhow::Result<()> {
    let ticket = state.feeds.controller(kind).write().await.begin_fetch();

    let fetched = state
        .monitor
        .measure_async(
            &kind.fetch_measure_name(),
            MeasureCategory::Api,
            fetch_feed_data(state, kind),
        )
        .await;

    match fetched {
        Ok(value) => {
            // Normalize the payload for the dashboard before it is cached.
            state
                .monitor
                .start_measure(&kind.shape_measure_name(), MeasureCategory::Filter);
            let shaped = shape_feed_payload(kind, value);
            state.monitor.end_measure(&kind.shape_measure_name());

            state
                .caches
                .set(kind.name(), CACHE_KEY, shaped.clone(), kind.priority());

            let accepted = state
                .feeds
                .controller(kind)
                .write()
                .await
                .complete(ticket, shaped);
            if accepted {
                let settle_state = state.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(SETTLE_WINDOW).await;
                    settle_state.feeds.controller(kind).write().await.settle();
                });
            } else {
                debug!("feed '{}' refresh superseded before completion", kind.name());
            }
            Ok(())
        }
        Err(err) => {
            state
                .feeds
                .controller(kind)
                .write()
                .await
                .fail(ticket, &err.to_string());
            Err(err)
        }
    }
}

/// Refreshes every feed in sequence, skipping feeds that already have a
/// refresh in flight, and updates the Prometheus gauges.
pub async fn refresh_all(state: &SharedState) {
    let started = Instant::now();
    state.refresh_in_progress.set(1.0);

    for kind in FeedKind::ALL {
        if state.feeds.controller(kind).read().await.is_updating() {
            debug!(
                "feed '{}' refresh already in progress, serving stale data",
                kind.name()
            );
            continue;
        }
        if let Err(err) = refresh_feed(state, kind).await {
            error!("refresh of feed '{}' failed: {}", kind.name(), err);
        }
    }

    let elapsed = started.elapsed().as_secs_f64();
    state.refresh_duration.set(elapsed);
    state.refresh_in_progress.set(0.0);

    let cache_stats = state.caches.aggregate_stats();
    state.cache_hit_rate.set(cache_stats.overall_hit_rate);
    state.cache_live_entries.set(cache_stats.total_size as f64);

    info!(
        "feed refresh completed: {} feeds, {:.2}ms",
        FeedKind::ALL.len(),
        elapsed * 1000.0
    );
}

/// Serves one feed read for the dashboard.
///
/// A cache miss (cold start or natural TTL expiry) triggers a background
/// refresh; the current view is returned immediately either way, so a
/// populated feed keeps rendering its retained data while the refresh runs.
pub async fn read_feed(state: &SharedState, kind: FeedKind) -> FeedView<Value> {
    let cached = state.caches.get(kind.name(), CACHE_KEY);

    if cached.is_none() {
        let already_updating = state.feeds.controller(kind).read().await.is_updating();
        if already_updating {
            debug!(
                "feed '{}' miss with refresh in flight, serving current view",
                kind.name()
            );
        } else {
            debug!("feed '{}' cache miss, triggering background refresh", kind.name());
            let state_clone = state.clone();
            tokio::spawn(async move {
                if let Err(err) = refresh_feed(&state_clone, kind).await {
                    error!(
                        "on-demand refresh of feed '{}' failed: {}",
                        kind.name(),
                        err
                    );
                }
            });
        }
    }

    state.feeds.view(kind).await
}

/// Periodic background refresh task.
pub async fn run_refresh_loop(state: SharedState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    // The first tick fires immediately; the initial population already
    // happened at startup, so consume it.
    interval.tick().await;

    loop {
        interval.tick().await;
        refresh_all(&state).await;
    }
}

/// Fetches the raw payload for one feed, from the ticket backend or the
/// synthetic data source.
async fn fetch_feed_data(state: &SharedState, kind: FeedKind) -> anyhow::Result<Value> {
    if let Some(upstream) = &state.upstream {
        let value = upstream.fetch_feed(kind.endpoint()).await?;
        return Ok(value);
    }
    Ok(synthetic_payload(kind))
}

/// Normalizes a fetched payload for the dashboard components.
fn shape_feed_payload(kind: FeedKind, value: Value) -> Value {
    match kind {
        FeedKind::NewTickets => sort_array_desc(value, "created_at"),
        FeedKind::TechnicianRanking => sort_array_desc(value, "resolved"),
        FeedKind::Metrics | FeedKind::SystemStatus => value,
    }
}

/// Sorts an array of objects descending by `field`; non-arrays and objects
/// missing the field pass through untouched.
fn sort_array_desc(value: Value, field: &str) -> Value {
    match value {
        Value::Array(mut items) => {
            items.sort_by(|a, b| {
                let a_key = a.get(field);
                let b_key = b.get(field);
                match (a_key, b_key) {
                    (Some(Value::Number(x)), Some(Value::Number(y))) => y
                        .as_f64()
                        .partial_cmp(&x.as_f64())
                        .unwrap_or(std::cmp::Ordering::Equal),
                    (Some(Value::String(x)), Some(Value::String(y))) => y.cmp(x),
                    _ => std::cmp::Ordering::Equal,
                }
            });
            Value::Array(items)
        }
        other => other,
    }
}

/// Synthetic feed data for running without a reachable ticket backend.
fn synthetic_payload(kind: FeedKind) -> Value {
    let mut rng = rand::thread_rng();
    match kind {
        FeedKind::Metrics => json!({
            "open_tickets": rng.gen_range(40..180),
            "closed_today": rng.gen_range(5..60),
            "avg_resolution_hours": rng.gen_range(2.0..48.0),
            "sla_breaches": rng.gen_range(0..5),
        }),
        FeedKind::SystemStatus => json!({
            "status": "operational",
            "checked_at": Utc::now().to_rfc3339(),
            "services": [
                { "name": "ticket-api", "status": "ok" },
                { "name": "auth", "status": "ok" },
                { "name": "notifications", "status": if rng.gen_bool(0.9) { "ok" } else { "degraded" } },
            ],
        }),
        FeedKind::TechnicianRanking => {
            let technicians = ["M. Rivera", "A. Chen", "S. Okafor", "J. Novak", "L. Haddad"];
            let ranking: Vec<Value> = technicians
                .iter()
                .map(|name| {
                    json!({
                        "name": name,
                        "resolved": rng.gen_range(3..45),
                        "avg_rating": rng.gen_range(3.5..5.0),
                    })
                })
                .collect();
            Value::Array(ranking)
        }
        FeedKind::NewTickets => {
            let subjects = [
                "Printer offline in finance",
                "VPN drops every hour",
                "Password reset request",
                "Laptop battery replacement",
                "Email sync failure",
            ];
            let count = rng.gen_range(2..=subjects.len());
            let tickets: Vec<Value> = (0..count)
                .map(|i| {
                    json!({
                        "id": format!("TCK-{}", rng.gen_range(10_000..99_999)),
                        "title": subjects[i],
                        "priority": if rng.gen_bool(0.2) { "high" } else { "normal" },
                        "created_at": Utc::now().to_rfc3339(),
                    })
                })
                .collect();
            Value::Array(tickets)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_names_round_trip() {
        for kind in FeedKind::ALL {
            assert_eq!(FeedKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(FeedKind::from_name("unknown"), None);
    }

    #[test]
    fn test_feed_priorities() {
        assert_eq!(FeedKind::NewTickets.priority(), Priority::High);
        assert_eq!(FeedKind::SystemStatus.priority(), Priority::Low);
    }

    #[test]
    fn test_shape_sorts_new_tickets_by_created_at() {
        let payload = json!([
            { "id": "TCK-1", "created_at": "2026-08-04T08:00:00Z" },
            { "id": "TCK-2", "created_at": "2026-08-04T10:00:00Z" },
            { "id": "TCK-3", "created_at": "2026-08-04T09:00:00Z" },
        ]);

        let shaped = shape_feed_payload(FeedKind::NewTickets, payload);
        let ids: Vec<&str> = shaped
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["TCK-2", "TCK-3", "TCK-1"]);
    }

    #[test]
    fn test_shape_sorts_ranking_by_resolved() {
        let payload = json!([
            { "name": "a", "resolved": 3 },
            { "name": "b", "resolved": 11 },
            { "name": "c", "resolved": 7 },
        ]);

        let shaped = shape_feed_payload(FeedKind::TechnicianRanking, payload);
        let resolved: Vec<i64> = shaped
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["resolved"].as_i64().unwrap())
            .collect();
        assert_eq!(resolved, vec![11, 7, 3]);
    }

    #[test]
    fn test_shape_passes_non_arrays_through() {
        let payload = json!({ "open_tickets": 12 });
        let shaped = shape_feed_payload(FeedKind::Metrics, payload.clone());
        assert_eq!(shaped, payload);
    }

    #[test]
    fn test_synthetic_payloads_have_expected_shape() {
        assert!(synthetic_payload(FeedKind::Metrics).get("open_tickets").is_some());
        assert!(synthetic_payload(FeedKind::SystemStatus).get("services").is_some());
        assert!(synthetic_payload(FeedKind::TechnicianRanking).is_array());
        assert!(synthetic_payload(FeedKind::NewTickets).is_array());
    }
}
