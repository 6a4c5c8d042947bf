//! Report types and bounded report history.
//!
//! This module provides the immutable `Report` snapshot produced by the
//! performance monitor, along with a fixed-size history buffer that retains
//! the most recent reports with predictable memory usage.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::monitor::{ComponentRenderStat, MeasurementSnapshot};

/// Number of reports retained in the history buffer.
pub const REPORT_HISTORY_CAPACITY: usize = 10;

/// Averaged timing summary for one report, in milliseconds.
///
/// The four local averages are always present (0.0 for empty inputs). The
/// optional fields come from the upstream performance endpoint and are only
/// set when that payload was fetched and parsed successfully.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportSummary {
    pub filter_time_ms: f64,
    pub api_response_time_ms: f64,
    pub render_time_ms: f64,
    pub total_operation_time_ms: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_request_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_cache_hit_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_health: Option<String>,
}

/// Upstream-derived summary fields, produced by the upstream client when the
/// performance endpoint responded with a usable payload.
#[derive(Debug, Clone, Default)]
pub struct SummaryExtras {
    pub request_count: Option<u64>,
    pub cache_hit_rate: Option<f64>,
    pub system_health: Option<String>,
}

impl ReportSummary {
    /// Merges upstream fields into this summary. Locally computed averages
    /// are never overwritten; the extras only fill the optional fields.
    pub fn apply_extras(&mut self, extras: &SummaryExtras) {
        self.upstream_request_count = extras.request_count;
        self.upstream_cache_hit_rate = extras.cache_hit_rate;
        self.system_health = extras.system_health.clone();
    }
}

/// Immutable point-in-time report of all telemetry state.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub timestamp: DateTime<Utc>,
    pub summary: ReportSummary,
    pub measurements: Vec<MeasurementSnapshot>,
    pub component_stats: Vec<ComponentRenderStat>,
}

/// A fixed-capacity buffer of past reports.
///
/// When the buffer is full, pushing a new report evicts the oldest one.
pub struct ReportHistory {
    reports: Vec<Report>,
    capacity: usize,
    write_index: usize,
    count: usize,
}

impl ReportHistory {
    /// Creates a new history buffer with the specified capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            reports: Vec::with_capacity(capacity),
            capacity: capacity.max(1),
            write_index: 0,
            count: 0,
        }
    }

    /// Pushes a new report into the buffer.
    ///
    /// If the buffer is full, the oldest report will be overwritten.
    pub fn push(&mut self, report: Report) {
        if self.reports.len() < self.capacity {
            self.reports.push(report);
        } else {
            self.reports[self.write_index] = report;
        }
        self.write_index = (self.write_index + 1) % self.capacity;

        if self.count < self.capacity {
            self.count += 1;
        }
    }

    /// Returns all retained reports in chronological order (oldest to newest).
    pub fn snapshot(&self) -> Vec<Report> {
        if self.count == 0 {
            return Vec::new();
        }

        let mut result = Vec::with_capacity(self.count);

        if self.count < self.capacity {
            // Buffer not yet full, reports are in order from 0 to count-1
            result.extend_from_slice(&self.reports[0..self.count]);
        } else {
            // Buffer is full, arrange from write_index (oldest) to end, then from 0
            result.extend_from_slice(&self.reports[self.write_index..]);
            result.extend_from_slice(&self.reports[0..self.write_index]);
        }

        result
    }

    /// Returns the most recent report, if any.
    pub fn latest(&self) -> Option<&Report> {
        if self.count == 0 {
            return None;
        }
        let idx = (self.write_index + self.capacity - 1) % self.capacity;
        self.reports.get(idx)
    }

    /// Returns the current number of retained reports.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if no reports are retained.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the maximum number of retained reports.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops all retained reports.
    pub fn clear(&mut self) {
        self.reports.clear();
        self.write_index = 0;
        self.count = 0;
    }
}

impl Default for ReportHistory {
    fn default() -> Self {
        Self::new(REPORT_HISTORY_CAPACITY)
    }
}
