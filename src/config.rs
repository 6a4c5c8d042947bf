//! Configuration management for deskflow-telemetry.
//!
//! This module handles loading, merging, and validating configuration from
//! files and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use deskflow_telemetry::cache::TtlPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9471;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 256;

/// Enhanced configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Feed refresh
    #[serde(alias = "refresh-interval")]
    pub refresh_interval_secs: Option<u64>,
    #[serde(alias = "synthetic-data")]
    pub synthetic_data: Option<bool>,

    // Upstream ticket API
    #[serde(alias = "upstream-url")]
    pub upstream_url: Option<String>,
    #[serde(alias = "upstream-timeout")]
    pub upstream_timeout_secs: Option<u64>,

    // Performance monitor
    #[serde(alias = "enable-monitor")]
    pub enable_monitor: Option<bool>,
    #[serde(alias = "max-measurements")]
    pub max_measurements: Option<usize>,
    #[serde(alias = "max-components")]
    pub max_components: Option<usize>,

    // Cache tuning: priority-to-TTL table plus the per-store entry bound
    #[serde(default)]
    pub ttl: TtlPolicy,
    #[serde(alias = "cache-max-entries")]
    pub cache_max_entries: Option<usize>,

    // Analytics export
    #[serde(alias = "enable-analytics-export")]
    pub enable_analytics_export: Option<bool>,

    // Logging
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            refresh_interval_secs: Some(DEFAULT_REFRESH_INTERVAL_SECS),
            synthetic_data: Some(true),
            upstream_url: None,
            upstream_timeout_secs: Some(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            enable_monitor: Some(true),
            max_measurements: None,
            max_components: None,
            ttl: TtlPolicy::default(),
            cache_max_entries: Some(DEFAULT_CACHE_MAX_ENTRIES),
            enable_analytics_export: Some(false),
            log_level: Some("info".into()),
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if cfg.refresh_interval_secs == Some(0) {
        return Err("refresh_interval_secs must be greater than zero".into());
    }

    if cfg.ttl.high_secs == 0 || cfg.ttl.medium_secs == 0 || cfg.ttl.low_secs == 0 {
        return Err("all ttl values must be greater than zero".into());
    }

    if cfg.cache_max_entries == Some(0) {
        return Err("cache_max_entries must be greater than zero".into());
    }

    let synthetic = cfg.synthetic_data.unwrap_or(false);
    if !synthetic {
        match cfg.upstream_url.as_deref() {
            Some(url) if !url.trim().is_empty() => {}
            _ => {
                return Err(
                    "upstream_url must be set when synthetic_data is disabled".into(),
                );
            }
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref().and_then(|p| p.to_str()))?
    };

    // Override with CLI args
    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }

    // Only override port if the user supplied it on the CLI.
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    if let Some(interval) = args.refresh_interval {
        config.refresh_interval_secs = Some(interval);
    }

    if let Some(url) = &args.upstream_url {
        config.upstream_url = Some(url.clone());
        config.synthetic_data = Some(false);
    }
    if args.synthetic_data {
        config.synthetic_data = Some(true);
    }

    if args.disable_monitor {
        config.enable_monitor = Some(false);
    }

    if args.enable_analytics_export {
        config.enable_analytics_export = Some(true);
    }

    if let Some(max_entries) = args.cache_max_entries {
        config.cache_max_entries = Some(max_entries);
    }

    Ok(config)
}

/// Enhanced configuration loading with multiple format support
pub fn load_config(path: Option<&str>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = if let Some(p) = path {
        PathBuf::from(p)
    } else {
        // Try default locations
        let defaults = [
            "/etc/deskflow/telemetry.yaml",
            "/etc/deskflow/telemetry.yml",
            "/etc/deskflow/telemetry.json",
            "./deskflow-telemetry.yaml",
            "./deskflow-telemetry.yml",
            "./deskflow-telemetry.json",
        ];

        defaults
            .iter()
            .find(|p| Path::new(p).exists())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(""))
    };

    if !path.exists() || path.to_string_lossy().is_empty() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };

    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as IoWrite;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(validate_effective_config(&config).is_ok());
        assert_eq!(config.port, Some(DEFAULT_PORT));
        assert_eq!(config.ttl.high_secs, 30);
        assert_eq!(config.ttl.low_secs, 300);
    }

    #[test]
    fn test_zero_ttl_is_rejected() {
        let mut config = Config::default();
        config.ttl.high_secs = 0;
        assert!(validate_effective_config(&config).is_err());
    }

    #[test]
    fn test_backend_mode_requires_upstream_url() {
        let mut config = Config::default();
        config.synthetic_data = Some(false);
        config.upstream_url = None;
        assert!(validate_effective_config(&config).is_err());

        config.upstream_url = Some("http://localhost:3000".to_string());
        assert!(validate_effective_config(&config).is_ok());
    }

    #[test]
    fn test_load_yaml_config_with_ttl_table() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "port: 9999\nttl:\n  high_secs: 10\n  low_secs: 600\n"
        )
        .unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.port, Some(9999));
        assert_eq!(config.ttl.high_secs, 10);
        // Unspecified table entries keep their defaults.
        assert_eq!(config.ttl.medium_secs, 120);
        assert_eq!(config.ttl.low_secs, 600);
    }

    #[test]
    fn test_load_json_config() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        writeln!(file, r#"{{ "port": 8123, "synthetic-data": true }}"#).unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.port, Some(8123));
        assert_eq!(config.synthetic_data, Some(true));
    }

    #[test]
    fn test_missing_config_file_falls_back_to_defaults() {
        let config = load_config(Some("/nonexistent/deskflow.yaml"));
        // A nonexistent explicit path silently falls back to defaults, the
        // same as no config file at all.
        assert!(config.is_ok());
        assert_eq!(config.unwrap().port, Some(DEFAULT_PORT));
    }
}
