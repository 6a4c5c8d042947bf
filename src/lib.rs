//! DeskFlow Telemetry Library
//!
//! This library provides the telemetry and adaptive caching core behind the
//! DeskFlow service-desk dashboard: a performance monitor that times data
//! operations and aggregates statistics, a priority-driven TTL cache for the
//! dashboard's data feeds, and the stale-while-revalidate controller that
//! decides what a feed renders while a refresh is in flight.
//!
//! It is framework-agnostic: the binary in this crate composes the pieces
//! into an axum sidecar service, but downstream projects can embed the same
//! types behind any web framework or UI loop.
//!
//! # Features
//!
//! - **Performance Monitor**: named start/end measurements, async operation
//!   wrapping, per-component render statistics, nearest-rank P95
//! - **Adaptive Cache**: per-dataset stores with priority-based TTLs from a
//!   config table, hit/miss analytics, deterministic eviction
//! - **Stale-While-Revalidate**: cached data keeps rendering during a
//!   background refresh; failures never blank a populated feed
//! - **Bounded Memory**: measurement maps, sample buffers, caches, and the
//!   report history all carry explicit capacity bounds
//!
//! # Usage
//!
//! ```rust
//! use deskflow_telemetry::{MeasureCategory, PerformanceMonitor};
//!
//! let monitor = PerformanceMonitor::default();
//!
//! // Time an operation
//! monitor.start_measure("api-tickets", MeasureCategory::Api);
//! // ... perform the fetch ...
//! let outcome = monitor.end_measure("api-tickets");
//! println!("fetch took {:.1}ms", outcome.as_millis());
//!
//! // Produce a point-in-time report
//! let report = monitor.generate_report(None);
//! println!("avg api time: {:.1}ms", report.summary.api_response_time_ms);
//! ```

pub mod cache;
pub mod cache_manager;
pub mod monitor;
pub mod report;
pub mod reporting;
pub mod swr;
pub mod upstream;

// Re-export main types for convenience
pub use cache::{CacheEntry, CacheStats, CacheStore, Priority, TtlPolicy};
pub use cache_manager::{AggregateCacheStats, CacheManager, NamedCacheStats};
pub use monitor::{
    ComponentRenderStat, DetailedStats, EndOutcome, MeasureCategory, MonitorLimits,
    PerformanceMonitor,
};
pub use report::{Report, ReportHistory, ReportSummary, SummaryExtras};
pub use reporting::AnalyticsExporter;
pub use swr::{FeedController, FeedPhase, FeedView, FetchTicket};
pub use upstream::{UpstreamClient, UpstreamError};
