//! Performance measurement engine for dashboard data operations.
//!
//! This module provides the `PerformanceMonitor`, which times named
//! operations (data filtering, API fetches, component renders), aggregates
//! per-component render statistics, and produces immutable point-in-time
//! reports. All methods take `&self` and use interior locking, so a single
//! monitor instance can be shared across request handlers and background
//! tasks.

use ahash::AHashMap as HashMap;
use chrono::Utc;
use serde::Serialize;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::report::{Report, ReportHistory, ReportSummary, SummaryExtras};

/// Default bound on concurrently tracked measurement names.
pub const DEFAULT_MAX_MEASUREMENTS: usize = 1024;

/// Default bound on tracked component render statistics.
pub const DEFAULT_MAX_COMPONENTS: usize = 256;

/// Default bound on retained completed-duration samples.
pub const DEFAULT_MAX_SAMPLES: usize = 2048;

/// Number of components listed in `DetailedStats::slowest_components`.
const SLOWEST_COMPONENT_COUNT: usize = 5;

/// Category of a timed operation, attached when the measurement starts.
///
/// Report bucketing dispatches on this tag; measurement names are free-form
/// identifiers and are never parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureCategory {
    /// Client-side filtering/sorting of already-fetched data.
    Filter,
    /// A network fetch against the ticket API.
    Api,
    /// A component render pass.
    Render,
    /// Anything else worth timing.
    Other,
}

/// A single named timed measurement.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub name: String,
    pub category: MeasureCategory,
    pub started_at: Instant,
    pub ended_at: Option<Instant>,
    pub duration: Option<Duration>,
    pub metadata: HashMap<String, String>,
}

impl Measurement {
    /// Returns true once the measurement has been ended.
    pub fn is_complete(&self) -> bool {
        self.duration.is_some()
    }

    /// Completed duration in milliseconds, 0.0 while still in flight.
    pub fn duration_ms(&self) -> f64 {
        self.duration.map(|d| d.as_secs_f64() * 1000.0).unwrap_or(0.0)
    }
}

/// Serializable snapshot of a measurement at report time.
#[derive(Debug, Clone, Serialize)]
pub struct MeasurementSnapshot {
    pub name: String,
    pub category: MeasureCategory,
    pub completed: bool,
    pub duration_ms: f64,
    pub metadata: Vec<(String, String)>,
}

impl From<&Measurement> for MeasurementSnapshot {
    fn from(m: &Measurement) -> Self {
        let mut metadata: Vec<(String, String)> = m
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        metadata.sort();
        Self {
            name: m.name.clone(),
            category: m.category,
            completed: m.is_complete(),
            duration_ms: m.duration_ms(),
            metadata,
        }
    }
}

/// One completed duration, retained for averages and percentiles after the
/// named measurement slot has been overwritten or cleared.
#[derive(Debug, Clone, Copy)]
struct CompletedSample {
    category: MeasureCategory,
    duration_ms: f64,
}

/// Outcome of ending a measurement.
///
/// Ending a measurement that was never started is not an error: components
/// may unmount before completing, and a re-render can discard an in-flight
/// start. The two cases stay distinguishable for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOutcome {
    /// The measurement existed and was completed.
    Completed { duration: Duration },
    /// No measurement with that name was in flight; nothing was recorded.
    NotStarted,
}

impl EndOutcome {
    /// Collapses the outcome to a duration, zero for `NotStarted`.
    pub fn as_duration(&self) -> Duration {
        match self {
            EndOutcome::Completed { duration } => *duration,
            EndOutcome::NotStarted => Duration::ZERO,
        }
    }

    /// Collapses the outcome to milliseconds, 0.0 for `NotStarted`.
    pub fn as_millis(&self) -> f64 {
        self.as_duration().as_secs_f64() * 1000.0
    }
}

/// Cumulative render statistics for one UI component.
///
/// The average is a running mean over all samples; every render weighs
/// equally.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentRenderStat {
    pub name: String,
    pub render_count: u64,
    pub total_render_time_ms: f64,
    pub average_render_time_ms: f64,
    pub last_render_time_ms: f64,
}

impl ComponentRenderStat {
    fn new(name: &str, render_time_ms: f64) -> Self {
        Self {
            name: name.to_string(),
            render_count: 1,
            total_render_time_ms: render_time_ms,
            average_render_time_ms: render_time_ms,
            last_render_time_ms: render_time_ms,
        }
    }

    fn record(&mut self, render_time_ms: f64) {
        self.render_count += 1;
        self.total_render_time_ms += render_time_ms;
        self.average_render_time_ms = self.total_render_time_ms / self.render_count as f64;
        self.last_render_time_ms = render_time_ms;
    }
}

/// Aggregate statistics derived on demand from the live telemetry state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DetailedStats {
    pub total_measurements: usize,
    pub completed_measurements: usize,
    pub recorded_samples: usize,
    pub component_count: usize,
    pub filter_p95_ms: f64,
    pub api_p95_ms: f64,
    pub slowest_components: Vec<ComponentRenderStat>,
}

/// Capacity bounds for the monitor's internal maps.
#[derive(Debug, Clone, Copy)]
pub struct MonitorLimits {
    pub max_measurements: usize,
    pub max_components: usize,
    pub max_samples: usize,
}

impl Default for MonitorLimits {
    fn default() -> Self {
        Self {
            max_measurements: DEFAULT_MAX_MEASUREMENTS,
            max_components: DEFAULT_MAX_COMPONENTS,
            max_samples: DEFAULT_MAX_SAMPLES,
        }
    }
}

/// Performance monitor holding in-flight and completed timed measurements
/// keyed by name, component render statistics, and the bounded report
/// history.
///
/// The name-keyed slot is last-write-wins: restarting a measurement under an
/// existing name replaces it. Completed durations are additionally appended
/// to a bounded sample buffer so summary averages and percentiles see every
/// finished operation, not only the most recent one per name.
pub struct PerformanceMonitor {
    enabled: AtomicBool,
    limits: MonitorLimits,
    measurements: Mutex<HashMap<String, Measurement>>,
    samples: Mutex<VecDeque<CompletedSample>>,
    components: Mutex<HashMap<String, ComponentRenderStat>>,
    history: Mutex<ReportHistory>,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(MonitorLimits::default())
    }
}

impl PerformanceMonitor {
    /// Creates a monitor with the given capacity bounds, enabled.
    pub fn new(limits: MonitorLimits) -> Self {
        Self {
            enabled: AtomicBool::new(true),
            limits: MonitorLimits {
                max_measurements: limits.max_measurements.max(1),
                max_components: limits.max_components.max(1),
                max_samples: limits.max_samples.max(1),
            },
            measurements: Mutex::new(HashMap::new()),
            samples: Mutex::new(VecDeque::new()),
            components: Mutex::new(HashMap::new()),
            history: Mutex::new(ReportHistory::default()),
        }
    }

    /// Enables or disables the monitor. While disabled, every method is an
    /// early-return no-op so instrumentation adds no overhead.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Starts (or restarts) the measurement for `name`.
    ///
    /// An unfinished measurement under the same name is overwritten without
    /// an error: on a re-entrant re-render the last start wins.
    pub fn start_measure(&self, name: &str, category: MeasureCategory) {
        self.start_measure_at(name, category, Instant::now());
    }

    /// Clock-injected variant of [`start_measure`](Self::start_measure).
    pub fn start_measure_at(&self, name: &str, category: MeasureCategory, now: Instant) {
        if !self.is_enabled() {
            return;
        }

        let Ok(mut map) = self.measurements.lock() else {
            return;
        };

        if !map.contains_key(name) && map.len() >= self.limits.max_measurements {
            evict_oldest_measurement(&mut map);
        }

        map.insert(
            name.to_string(),
            Measurement {
                name: name.to_string(),
                category,
                started_at: now,
                ended_at: None,
                duration: None,
                metadata: HashMap::new(),
            },
        );
    }

    /// Ends the measurement for `name`, computing its duration.
    pub fn end_measure(&self, name: &str) -> EndOutcome {
        self.end_measure_at(name, Instant::now(), &[])
    }

    /// Ends the measurement for `name`, merging extra metadata entries.
    pub fn end_measure_with(&self, name: &str, metadata: &[(&str, &str)]) -> EndOutcome {
        self.end_measure_at(name, Instant::now(), metadata)
    }

    /// Clock-injected variant of [`end_measure_with`](Self::end_measure_with).
    pub fn end_measure_at(&self, name: &str, now: Instant, metadata: &[(&str, &str)]) -> EndOutcome {
        if !self.is_enabled() {
            return EndOutcome::NotStarted;
        }

        let (duration, sample) = {
            let Ok(mut map) = self.measurements.lock() else {
                return EndOutcome::NotStarted;
            };

            let Some(measurement) = map.get_mut(name) else {
                debug!("end_measure for '{}' without a matching start", name);
                return EndOutcome::NotStarted;
            };

            // A clock rewind between start and end would yield a negative
            // span; clamp to zero so durations stay non-negative.
            let duration = now.saturating_duration_since(measurement.started_at);
            measurement.ended_at = Some(now);
            measurement.duration = Some(duration);
            for (k, v) in metadata {
                measurement.metadata.insert((*k).to_string(), (*v).to_string());
            }

            (
                duration,
                CompletedSample {
                    category: measurement.category,
                    duration_ms: duration.as_secs_f64() * 1000.0,
                },
            )
        };

        if let Ok(mut samples) = self.samples.lock() {
            samples.push_back(sample);
            while samples.len() > self.limits.max_samples {
                samples.pop_front();
            }
        }

        EndOutcome::Completed { duration }
    }

    /// Times an async operation under `name`.
    ///
    /// The operation's result is passed through unchanged; an error is
    /// recorded in the measurement metadata and then rethrown, never
    /// swallowed.
    pub async fn measure_async<T, E, Fut>(
        &self,
        name: &str,
        category: MeasureCategory,
        operation: Fut,
    ) -> Result<T, E>
    where
        E: std::fmt::Display,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.is_enabled() {
            return operation.await;
        }

        self.start_measure(name, category);
        match operation.await {
            Ok(value) => {
                self.end_measure_with(name, &[("success", "true")]);
                Ok(value)
            }
            Err(err) => {
                let err_msg = err.to_string();
                self.end_measure_with(name, &[("success", "false"), ("error", &err_msg)]);
                Err(err)
            }
        }
    }

    /// Records one render sample for the component `name`.
    pub fn record_component_render(&self, name: &str, render_time: Duration) {
        if !self.is_enabled() {
            return;
        }

        let render_time_ms = render_time.as_secs_f64() * 1000.0;
        let Ok(mut map) = self.components.lock() else {
            return;
        };

        if let Some(stat) = map.get_mut(name) {
            stat.record(render_time_ms);
            return;
        }

        if map.len() >= self.limits.max_components {
            evict_coldest_component(&mut map);
        }
        map.insert(name.to_string(), ComponentRenderStat::new(name, render_time_ms));
    }

    /// Generates an immutable report from the current state and appends it
    /// to the bounded history.
    ///
    /// `extras` carries upstream-derived summary fields; pass `None` when the
    /// upstream endpoint was unavailable and the summary stays local-only.
    pub fn generate_report(&self, extras: Option<&SummaryExtras>) -> Report {
        let measurements = self.measurements_snapshot();
        let component_stats = self.components_snapshot();
        let samples = self.samples_snapshot();

        let mut summary = ReportSummary {
            filter_time_ms: category_average(&samples, Some(MeasureCategory::Filter)),
            api_response_time_ms: category_average(&samples, Some(MeasureCategory::Api)),
            render_time_ms: category_average(&samples, Some(MeasureCategory::Render)),
            total_operation_time_ms: category_average(&samples, None),
            ..ReportSummary::default()
        };
        if let Some(extras) = extras {
            summary.apply_extras(extras);
        }

        let report = Report {
            timestamp: Utc::now(),
            summary,
            measurements,
            component_stats,
        };

        if let Ok(mut history) = self.history.lock() {
            history.push(report.clone());
        }

        report
    }

    /// Derives aggregate statistics from the live telemetry state.
    ///
    /// Empty inputs produce zeros, never NaN or infinity.
    pub fn detailed_stats(&self) -> DetailedStats {
        let measurements = self.measurements_snapshot();
        let components = self.components_snapshot();
        let samples = self.samples_snapshot();

        let completed = measurements.iter().filter(|m| m.completed).count();
        let filter_p95_ms = category_p95(&samples, MeasureCategory::Filter);
        let api_p95_ms = category_p95(&samples, MeasureCategory::Api);

        let mut slowest = components.clone();
        slowest.sort_by(|a, b| {
            b.average_render_time_ms
                .partial_cmp(&a.average_render_time_ms)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        slowest.truncate(SLOWEST_COMPONENT_COUNT);

        DetailedStats {
            total_measurements: measurements.len(),
            completed_measurements: completed,
            recorded_samples: samples.len(),
            component_count: components.len(),
            filter_p95_ms,
            api_p95_ms,
            slowest_components: slowest,
        }
    }

    /// Snapshot of all current measurements, sorted by name for stable output.
    pub fn measurements_snapshot(&self) -> Vec<MeasurementSnapshot> {
        let mut snapshot: Vec<MeasurementSnapshot> = match self.measurements.lock() {
            Ok(map) => map.values().map(MeasurementSnapshot::from).collect(),
            Err(_) => Vec::new(),
        };
        snapshot.sort_by(|a, b| a.name.cmp(&b.name));
        snapshot
    }

    /// Snapshot of all component render statistics, sorted by name.
    pub fn components_snapshot(&self) -> Vec<ComponentRenderStat> {
        let mut snapshot: Vec<ComponentRenderStat> = match self.components.lock() {
            Ok(map) => map.values().cloned().collect(),
            Err(_) => Vec::new(),
        };
        snapshot.sort_by(|a, b| a.name.cmp(&b.name));
        snapshot
    }

    fn samples_snapshot(&self) -> Vec<CompletedSample> {
        match self.samples.lock() {
            Ok(samples) => samples.iter().copied().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Retained report history, oldest first.
    pub fn report_history(&self) -> Vec<Report> {
        match self.history.lock() {
            Ok(history) => history.snapshot(),
            Err(_) => Vec::new(),
        }
    }

    /// Empties the measurement map, sample buffer, and component stats.
    ///
    /// The report history is untouched; use
    /// [`clear_reports`](Self::clear_reports) for that.
    pub fn clear(&self) {
        if let Ok(mut map) = self.measurements.lock() {
            map.clear();
        }
        if let Ok(mut samples) = self.samples.lock() {
            samples.clear();
        }
        if let Ok(mut map) = self.components.lock() {
            map.clear();
        }
        debug!("performance monitor cleared");
    }

    /// Drops all retained reports.
    pub fn clear_reports(&self) {
        if let Ok(mut history) = self.history.lock() {
            history.clear();
        }
    }
}

/// Removes the measurement with the oldest start time.
fn evict_oldest_measurement(map: &mut HashMap<String, Measurement>) {
    let oldest = map
        .values()
        .min_by_key(|m| m.started_at)
        .map(|m| m.name.clone());
    if let Some(name) = oldest {
        debug!("measurement map full, evicting oldest entry '{}'", name);
        map.remove(&name);
    }
}

/// Removes the component stat with the fewest recorded renders, ties broken
/// by name so the victim is deterministic.
fn evict_coldest_component(map: &mut HashMap<String, ComponentRenderStat>) {
    let coldest = map
        .values()
        .min_by(|a, b| {
            a.render_count
                .cmp(&b.render_count)
                .then_with(|| a.name.cmp(&b.name))
        })
        .map(|s| s.name.clone());
    if let Some(name) = coldest {
        debug!("component map full, evicting '{}'", name);
        map.remove(&name);
    }
}

/// Mean duration over completed samples, optionally restricted to one
/// category. 0.0 when there are no matching samples.
fn category_average(samples: &[CompletedSample], category: Option<MeasureCategory>) -> f64 {
    let matching: Vec<f64> = samples
        .iter()
        .filter(|s| category.map_or(true, |c| s.category == c))
        .map(|s| s.duration_ms)
        .collect();
    if matching.is_empty() {
        return 0.0;
    }
    matching.iter().sum::<f64>() / matching.len() as f64
}

/// Nearest-rank 95th percentile of completed durations for one category.
fn category_p95(samples: &[CompletedSample], category: MeasureCategory) -> f64 {
    let matching: Vec<f64> = samples
        .iter()
        .filter(|s| s.category == category)
        .map(|s| s.duration_ms)
        .collect();
    percentile_nearest_rank(matching, 0.95)
}

/// Nearest-rank percentile: `sorted[ceil(n * pct) - 1]`, clamped to the
/// first element for small inputs. Empty input yields 0.0.
pub fn percentile_nearest_rank(mut samples: Vec<f64>, pct: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = (samples.len() as f64 * pct).ceil() as usize;
    let index = rank.saturating_sub(1).min(samples.len() - 1);
    samples[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_without_start_is_not_started() {
        let monitor = PerformanceMonitor::default();
        let outcome = monitor.end_measure("never-started");
        assert_eq!(outcome, EndOutcome::NotStarted);
        assert_eq!(outcome.as_duration(), Duration::ZERO);
        assert_eq!(outcome.as_millis(), 0.0);
    }

    #[test]
    fn test_duration_matches_injected_clock() {
        let monitor = PerformanceMonitor::default();
        let start = Instant::now();

        monitor.start_measure_at("load-tickets", MeasureCategory::Api, start);
        let outcome =
            monitor.end_measure_at("load-tickets", start + Duration::from_millis(150), &[]);

        assert_eq!(
            outcome.as_duration(),
            Duration::from_millis(150)
        );

        let snapshot = monitor.measurements_snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].completed);
        assert!((snapshot[0].duration_ms - 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_restart_overwrites_unfinished_measurement() {
        let monitor = PerformanceMonitor::default();
        let start = Instant::now();

        monitor.start_measure_at("filter-tickets", MeasureCategory::Filter, start);
        // Re-entrant re-render restarts the same measurement; last start wins.
        monitor.start_measure_at(
            "filter-tickets",
            MeasureCategory::Filter,
            start + Duration::from_millis(40),
        );

        let outcome =
            monitor.end_measure_at("filter-tickets", start + Duration::from_millis(100), &[]);
        assert_eq!(
            outcome.as_duration(),
            Duration::from_millis(60),
            "duration must be measured from the most recent start"
        );
    }

    #[test]
    fn test_disabled_monitor_is_a_no_op() {
        let monitor = PerformanceMonitor::default();
        monitor.set_enabled(false);

        monitor.start_measure("x", MeasureCategory::Other);
        assert_eq!(monitor.end_measure("x"), EndOutcome::NotStarted);
        monitor.record_component_render("TicketTable", Duration::from_millis(5));

        assert!(monitor.measurements_snapshot().is_empty());
        assert!(monitor.components_snapshot().is_empty());

        monitor.set_enabled(true);
        monitor.start_measure("x", MeasureCategory::Other);
        assert!(!monitor.measurements_snapshot().is_empty());
    }

    #[test]
    fn test_component_render_running_mean() {
        let monitor = PerformanceMonitor::default();

        monitor.record_component_render("RankingTable", Duration::from_millis(10));
        monitor.record_component_render("RankingTable", Duration::from_millis(30));

        let stats = monitor.components_snapshot();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].render_count, 2);
        assert!((stats[0].total_render_time_ms - 40.0).abs() < 1e-6);
        assert!((stats[0].average_render_time_ms - 20.0).abs() < 1e-6);
        assert!((stats[0].last_render_time_ms - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_percentile_nearest_rank() {
        // ceil(5 * 0.95) - 1 = 4 -> last element
        let p95 = percentile_nearest_rank(vec![10.0, 20.0, 30.0, 40.0, 100.0], 0.95);
        assert_eq!(p95, 100.0);

        // Small inputs clamp to the first element, empty yields zero.
        assert_eq!(percentile_nearest_rank(vec![7.0], 0.95), 7.0);
        assert_eq!(percentile_nearest_rank(Vec::new(), 0.95), 0.0);
    }

    #[test]
    fn test_detailed_stats_empty_monitor_all_zero() {
        let monitor = PerformanceMonitor::default();
        let stats = monitor.detailed_stats();

        assert_eq!(stats.total_measurements, 0);
        assert_eq!(stats.completed_measurements, 0);
        assert_eq!(stats.recorded_samples, 0);
        assert_eq!(stats.component_count, 0);
        assert_eq!(stats.filter_p95_ms, 0.0);
        assert_eq!(stats.api_p95_ms, 0.0);
        assert!(stats.slowest_components.is_empty());
        assert!(stats.filter_p95_ms.is_finite());
        assert!(stats.api_p95_ms.is_finite());
    }

    #[test]
    fn test_report_averages_same_name_samples() {
        let monitor = PerformanceMonitor::default();
        let start = Instant::now();

        // Three sequential fetches reuse the measurement name; the summary
        // must still average all three durations, not only the last slot.
        for (offset, duration_ms) in [(0u64, 50u64), (1000, 150), (2000, 250)] {
            let t0 = start + Duration::from_millis(offset);
            monitor.start_measure_at("api-tickets", MeasureCategory::Api, t0);
            monitor.end_measure_at("api-tickets", t0 + Duration::from_millis(duration_ms), &[]);
        }

        let report = monitor.generate_report(None);
        assert!((report.summary.api_response_time_ms - 150.0).abs() < 1e-6);
        // The name-keyed store keeps one slot per name.
        assert_eq!(report.measurements.len(), 1);
    }

    #[test]
    fn test_measurement_map_is_bounded() {
        let monitor = PerformanceMonitor::new(MonitorLimits {
            max_measurements: 3,
            max_components: 3,
            max_samples: 8,
        });
        let start = Instant::now();

        for i in 0..5 {
            monitor.start_measure_at(
                &format!("op-{}", i),
                MeasureCategory::Other,
                start + Duration::from_millis(i),
            );
        }

        let snapshot = monitor.measurements_snapshot();
        assert_eq!(snapshot.len(), 3);
        // The two oldest starts were evicted.
        let names: Vec<&str> = snapshot.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["op-2", "op-3", "op-4"]);
    }

    #[test]
    fn test_clear_keeps_report_history() {
        let monitor = PerformanceMonitor::default();
        let start = Instant::now();

        monitor.start_measure_at("api-tickets", MeasureCategory::Api, start);
        monitor.end_measure_at("api-tickets", start + Duration::from_millis(50), &[]);
        monitor.generate_report(None);

        monitor.clear();
        assert!(monitor.measurements_snapshot().is_empty());
        assert_eq!(monitor.detailed_stats().recorded_samples, 0);
        assert_eq!(monitor.report_history().len(), 1);

        monitor.clear_reports();
        assert!(monitor.report_history().is_empty());
    }

    #[tokio::test]
    async fn test_measure_async_passes_errors_through() {
        let monitor = PerformanceMonitor::default();

        let ok: Result<u32, String> = monitor
            .measure_async("api-ranking", MeasureCategory::Api, async { Ok(7u32) })
            .await;
        assert_eq!(ok.unwrap(), 7);

        let err: Result<u32, String> = monitor
            .measure_async("api-ranking", MeasureCategory::Api, async {
                Err("backend unreachable".to_string())
            })
            .await;
        assert_eq!(err.unwrap_err(), "backend unreachable");

        let snapshot = monitor.measurements_snapshot();
        let m = snapshot.iter().find(|m| m.name == "api-ranking").unwrap();
        assert!(m.completed);
        assert!(m
            .metadata
            .iter()
            .any(|(k, v)| k == "success" && v == "false"));
        assert!(m
            .metadata
            .iter()
            .any(|(k, v)| k == "error" && v == "backend unreachable"));
    }
}
