//! deskflow-telemetry - version 0.1.0
//!
//! Telemetry and adaptive caching sidecar for the DeskFlow dashboard.
//! This is the main entry point that initializes the service, the background
//! feed refresh task, and the HTTP surface.

mod cli;
mod config;
mod feeds;
mod handlers;
mod state;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use prometheus::{Gauge, Registry};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::{net::TcpListener, signal};
use tracing::{error, info, Level};

use deskflow_telemetry::monitor::{DEFAULT_MAX_COMPONENTS, DEFAULT_MAX_MEASUREMENTS};
use deskflow_telemetry::{
    AnalyticsExporter, CacheManager, MonitorLimits, PerformanceMonitor, UpstreamClient,
};

use cli::{Args, LogLevel};
use config::{
    resolve_config, show_config, validate_effective_config, Config, DEFAULT_BIND_ADDR,
    DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_PORT, DEFAULT_REFRESH_INTERVAL_SECS,
    DEFAULT_UPSTREAM_TIMEOUT_SECS,
};
use feeds::FeedStates;
use handlers::{
    clear_handler, clear_reports_handler, dashboard_handler, feed_handler, metrics_handler,
    report_handler, report_history_handler, root_handler, stats_handler,
};
use state::AppState;

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(args: &Args) {
    let log_level = match args.log_level {
        LogLevel::Off => Level::ERROR,
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Logging initialized with level: {:?}", args.log_level);
}

/// Builds the performance monitor from configuration.
fn build_monitor(config: &Config) -> PerformanceMonitor {
    let monitor = PerformanceMonitor::new(MonitorLimits {
        max_measurements: config.max_measurements.unwrap_or(DEFAULT_MAX_MEASUREMENTS),
        max_components: config.max_components.unwrap_or(DEFAULT_MAX_COMPONENTS),
        ..MonitorLimits::default()
    });
    monitor.set_enabled(config.enable_monitor.unwrap_or(true));
    monitor
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    // Load configuration for main server mode
    let config = resolve_config(&args)?;

    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }

    setup_logging(&args);

    info!("Starting deskflow-telemetry");

    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
    let port = config.port.unwrap_or(DEFAULT_PORT);

    // Initialize Prometheus metrics registry
    let registry = Registry::new();

    let cache_hit_rate = Gauge::new(
        "deskflow_telemetry_cache_hit_rate",
        "Cumulative cache hit rate across all feed stores (0.0-1.0)",
    )?;
    let cache_live_entries = Gauge::new(
        "deskflow_telemetry_cache_live_entries",
        "Number of live (unexpired) cache entries across all feed stores",
    )?;
    let reports_retained = Gauge::new(
        "deskflow_telemetry_reports_retained",
        "Number of reports currently retained in the bounded history",
    )?;
    let refresh_duration = Gauge::new(
        "deskflow_telemetry_refresh_duration_seconds",
        "Time spent in the most recent full feed refresh",
    )?;
    let refresh_in_progress = Gauge::new(
        "deskflow_telemetry_refresh_in_progress",
        "Whether a full feed refresh is currently in progress (1) or idle (0)",
    )?;

    registry.register(Box::new(cache_hit_rate.clone()))?;
    registry.register(Box::new(cache_live_entries.clone()))?;
    registry.register(Box::new(reports_retained.clone()))?;
    registry.register(Box::new(refresh_duration.clone()))?;
    registry.register(Box::new(refresh_in_progress.clone()))?;

    // Build the telemetry core from configuration
    let monitor = Arc::new(build_monitor(&config));
    let caches = Arc::new(CacheManager::new(
        config.ttl.clone(),
        config.cache_max_entries.unwrap_or(DEFAULT_CACHE_MAX_ENTRIES),
    ));
    let exporter = AnalyticsExporter::new(config.enable_analytics_export.unwrap_or(false));

    let synthetic = config.synthetic_data.unwrap_or(true);
    let upstream = if synthetic {
        info!("Synthetic data mode: feeds are generated locally");
        None
    } else {
        // Validation guarantees the URL is present in backend mode.
        let url = config.upstream_url.as_deref().unwrap_or_default();
        let timeout = Duration::from_secs(
            config
                .upstream_timeout_secs
                .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        );
        info!("Ticket backend: {}", url);
        Some(UpstreamClient::new(url, timeout)?)
    };

    let refresh_interval_secs = config
        .refresh_interval_secs
        .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS);

    let state = Arc::new(AppState {
        registry,
        cache_hit_rate,
        cache_live_entries,
        reports_retained,
        refresh_duration,
        refresh_in_progress,
        monitor,
        caches,
        feeds: FeedStates::new(),
        exporter,
        upstream,
        config: Arc::new(config.clone()),
        start_time: Instant::now(),
    });

    // Perform initial feed population
    info!("Performing initial feed refresh");
    feeds::refresh_all(&state).await;

    // Background periodic refresh
    let refresh_state = state.clone();
    tokio::spawn(async move {
        feeds::run_refresh_loop(refresh_state, refresh_interval_secs).await;
    });
    info!(
        "Background feed refresh scheduled every {}s",
        refresh_interval_secs
    );

    // Setup graceful shutdown signal handlers
    let shutdown_signal = async {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
            }
            _ = terminate => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    };

    // Configure HTTP server routes
    let addr: SocketAddr = format!("{}:{}", bind_ip_str, port).parse()?;

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/report", get(report_handler))
        .route("/report/history", get(report_history_handler))
        .route("/stats", get(stats_handler))
        .route("/dashboard", get(dashboard_handler))
        .route("/feeds/{name}", get(feed_handler))
        .route("/metrics", get(metrics_handler))
        .route("/clear", post(clear_handler))
        .route("/clear/reports", post(clear_reports_handler))
        .with_state(state.clone());

    let listener = TcpListener::bind(addr).await?;
    info!(
        "deskflow-telemetry listening on http://{}:{}",
        bind_ip_str, port
    );

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = shutdown_signal => {
            info!("Shutdown signal received, exiting...");
        }
    }

    info!("deskflow-telemetry stopped gracefully");
    Ok(())
}
