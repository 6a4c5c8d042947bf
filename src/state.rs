//! Application state management for the telemetry service.
//!
//! This module defines the shared application state that is passed to HTTP
//! handlers and used by the background feed refresh task. The state is the
//! composition root: the monitor, cache manager, and feed controllers are
//! explicit instances owned here, never module-level globals.

use prometheus::{Gauge, Registry};
use std::sync::Arc;
use std::time::Instant;

use deskflow_telemetry::{AnalyticsExporter, CacheManager, PerformanceMonitor, UpstreamClient};

use crate::config::Config;
use crate::feeds::FeedStates;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests and background tasks.
pub struct AppState {
    pub registry: Registry,
    pub cache_hit_rate: Gauge,
    pub cache_live_entries: Gauge,
    pub reports_retained: Gauge,
    pub refresh_duration: Gauge,
    pub refresh_in_progress: Gauge,
    pub monitor: Arc<PerformanceMonitor>,
    pub caches: Arc<CacheManager>,
    pub feeds: FeedStates,
    pub exporter: AnalyticsExporter,
    /// Ticket backend client; `None` in synthetic-data mode.
    pub upstream: Option<UpstreamClient>,
    pub config: Arc<Config>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}
