//! Statistics endpoint handler.
//!
//! This module provides the `/stats` endpoint returning detailed monitor
//! statistics, aggregated cache statistics, and the process's own resource
//! usage as JSON for the cache monitoring UI.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::{debug, instrument};

use deskflow_telemetry::{AggregateCacheStats, DetailedStats};

use crate::state::SharedState;

/// The service's own resource usage, read from /proc/self.
///
/// Fields fall back to zero on platforms without procfs.
#[derive(Debug, Default, Serialize)]
pub struct ProcessStats {
    pub memory_mb: f64,
    pub open_fds: u64,
}

/// Combined statistics payload for the monitoring UI.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub monitor: DetailedStats,
    pub cache: AggregateCacheStats,
    pub process: ProcessStats,
    pub uptime_secs: u64,
}

/// Handler for the `/stats` endpoint.
#[instrument(skip(state))]
pub async fn stats_handler(State(state): State<SharedState>) -> Json<StatsResponse> {
    debug!("Processing /stats request");

    Json(StatsResponse {
        monitor: state.monitor.detailed_stats(),
        cache: state.caches.aggregate_stats(),
        process: read_process_stats(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Reads the service's resource usage from /proc/self.
fn read_process_stats() -> ProcessStats {
    ProcessStats {
        memory_mb: read_self_memory_mb().unwrap_or(0.0),
        open_fds: read_self_fd_count().unwrap_or(0),
    }
}

/// Reads the service's RSS memory usage from /proc/self/status.
fn read_self_memory_mb() -> Option<f64> {
    let content = std::fs::read_to_string("/proc/self/status").ok()?;
    for line in content.lines() {
        if let Some(value) = line.strip_prefix("VmRSS:") {
            let kb: u64 = value.split_whitespace().next()?.parse().ok()?;
            return Some(kb as f64 / 1024.0);
        }
    }
    None
}

/// Counts the service's open file descriptors from /proc/self/fd.
fn read_self_fd_count() -> Option<u64> {
    let entries = std::fs::read_dir("/proc/self/fd").ok()?;
    Some(entries.count() as u64)
}
