//! HTTP endpoint handlers for the telemetry service.
//!
//! Each submodule provides the handler(s) for one endpoint group. All
//! handlers receive the shared application state via axum's `State`
//! extractor.

mod clear;
mod dashboard;
mod feeds;
mod metrics;
mod report;
mod root;
mod stats;

pub use clear::{clear_handler, clear_reports_handler};
pub use dashboard::dashboard_handler;
pub use feeds::feed_handler;
pub use metrics::metrics_handler;
pub use report::{report_handler, report_history_handler};
pub use root::root_handler;
pub use stats::stats_handler;
