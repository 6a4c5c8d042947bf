//! CLI arguments for deskflow-telemetry.
//!
//! This module defines the command-line interface structure using the clap
//! library, including all flags and options.

use clap::{Parser, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "deskflow-telemetry",
    about = "Telemetry and adaptive caching sidecar for the DeskFlow dashboard",
    long_about = "Telemetry and adaptive caching sidecar for the DeskFlow service-desk dashboard.\n\n\
                  Measures data-operation performance, caches dashboard feeds with \
                  priority-based TTLs, serves feeds with stale-while-revalidate \
                  semantics, and exposes live statistics for the monitoring pages.",
    author = "DeskFlow Engineering <platform@deskflow.example>",
    version = "0.1.0",
    propagate_version = true
)]
pub struct Args {
    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Background feed refresh interval in seconds
    #[arg(long)]
    pub refresh_interval: Option<u64>,

    /// Base URL of the ticket backend (e.g. http://localhost:3000)
    #[arg(long)]
    pub upstream_url: Option<String>,

    /// Run from synthetic feed data instead of the ticket backend
    #[arg(long, conflicts_with = "upstream_url")]
    pub synthetic_data: bool,

    /// Disable the performance monitor (instrumentation becomes no-ops)
    #[arg(long)]
    pub disable_monitor: bool,

    /// Enable analytics export of generated reports
    #[arg(long)]
    pub enable_analytics_export: bool,

    /// Override the cache entry bound per store
    #[arg(long)]
    pub cache_max_entries: Option<usize>,
}
