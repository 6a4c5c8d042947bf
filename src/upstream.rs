//! Upstream ticket-API client for the performance metrics endpoint.
//!
//! The backend exposes `GET /api/performance/metrics` returning
//! `{ success, data: { filter_performance, cache_stats, system_health } }`.
//! The payload is merged opportunistically into generated reports: every
//! field is optional, and any transport or shape failure falls back to the
//! locally computed values with a logged warning. Report generation never
//! fails because of this endpoint.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::report::SummaryExtras;

/// Errors from the upstream ticket API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("endpoint reported failure: {0}")]
    Rejected(String),
}

/// Response wrapper used by the ticket backend's JSON API.
#[derive(Debug, Deserialize)]
struct MetricsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<MetricsData>,
}

#[derive(Debug, Default, Deserialize)]
struct MetricsData {
    #[serde(default)]
    filter_performance: Option<FilterPerformance>,
    #[serde(default)]
    cache_stats: Option<UpstreamCacheStats>,
    #[serde(default)]
    system_health: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FilterPerformance {
    #[serde(default)]
    request_count: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamCacheStats {
    #[serde(default)]
    hit_rate: Option<f64>,
}

/// Envelope used by the backend's feed endpoints.
#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

fn extras_from(data: MetricsData) -> SummaryExtras {
    SummaryExtras {
        request_count: data.filter_performance.and_then(|f| f.request_count),
        cache_hit_rate: data.cache_stats.and_then(|c| c.hit_rate),
        system_health: data.system_health,
    }
}

/// HTTP client for the ticket backend's performance endpoint.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
}

impl UpstreamClient {
    /// Creates a client with a bounded request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches the performance metrics payload.
    ///
    /// Transport errors, non-2xx statuses, shape mismatches, and
    /// `success=false` all surface as errors; the caller decides whether to
    /// recover.
    pub async fn fetch_performance_metrics(&self) -> Result<SummaryExtras, UpstreamError> {
        let url = format!("{}/api/performance/metrics", self.base_url);
        debug!("fetching upstream performance metrics from {}", url);

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let payload: MetricsResponse = response.json().await?;

        if !payload.success {
            return Err(UpstreamError::Rejected("success=false".to_string()));
        }

        Ok(extras_from(payload.data.unwrap_or_default()))
    }

    /// Fetches one dashboard feed (e.g. `/api/tickets/new`) and returns the
    /// unwrapped `data` value from the backend's response envelope.
    pub async fn fetch_feed(&self, path: &str) -> Result<serde_json::Value, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("fetching feed from {}", url);

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let payload: FeedResponse = response.json().await?;

        if !payload.success {
            return Err(UpstreamError::Rejected(
                payload.message.unwrap_or_else(|| "success=false".to_string()),
            ));
        }

        Ok(payload.data.unwrap_or(serde_json::Value::Null))
    }

    /// Recovering variant for report generation: any failure is logged and
    /// collapsed to `None`, so the report falls back to local values.
    pub async fn summary_extras(&self) -> Option<SummaryExtras> {
        match self.fetch_performance_metrics().await {
            Ok(extras) => Some(extras),
            Err(err) => {
                warn!(
                    "upstream performance metrics unavailable, using local values: {}",
                    err
                );
                None
            }
        }
    }
}
