//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `CALBRIDGE_DB_PATH`: Database file path (required)
//! - `CALBRIDGE_DB_POOL_SIZE`: Connection pool size
//! - `CALBRIDGE_SYNC_CRON`: Cron expression for the sync sweep
//! - `CALBRIDGE_SYNC_INTERVAL`: Per-subscription sync interval in seconds
//! - `CALBRIDGE_FETCH_TIMEOUT`: Feed fetch timeout in seconds
//! - `CALBRIDGE_SYNC_CONCURRENCY`: Concurrent syncs per sweep
//! - `CALBRIDGE_SYNC_ENABLED`: Whether background sync runs (true/false)
//! - `CALBRIDGE_BIND_ADDR`: HTTP server bind address
//!
//! ## File Locations
//! The loader probes `config.{json,toml}` and `calbridge.{json,toml}` in the
//! working directory, up to two parent directories, and next to the
//! executable.

use std::path::{Path, PathBuf};

use calbridge_domain::{
    CalBridgeError, Config, DatabaseConfig, Result, ServerConfig, SyncConfig,
};

/// Load configuration with automatic fallback strategy
///
/// Reads a `.env` file when present, then attempts environment variables and
/// finally falls back to a config file.
///
/// # Errors
/// Returns `CalBridgeError::Config` if configuration cannot be loaded from
/// either source.
pub fn load() -> Result<Config> {
    dotenvy::dotenv().ok();

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `CALBRIDGE_DB_PATH` is required; everything else falls back to its
/// default.
///
/// # Errors
/// Returns `CalBridgeError::Config` if the database path is missing or any
/// set variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("CALBRIDGE_DB_PATH")?;
    let defaults = SyncConfig::default();

    let config = Config {
        database: DatabaseConfig {
            path: db_path,
            pool_size: env_parsed("CALBRIDGE_DB_POOL_SIZE", 4)?,
        },
        sync: SyncConfig {
            cron_expression: std::env::var("CALBRIDGE_SYNC_CRON")
                .unwrap_or(defaults.cron_expression),
            interval_secs: env_parsed("CALBRIDGE_SYNC_INTERVAL", defaults.interval_secs)?,
            fetch_timeout_secs: env_parsed(
                "CALBRIDGE_FETCH_TIMEOUT",
                defaults.fetch_timeout_secs,
            )?,
            max_concurrent: env_parsed("CALBRIDGE_SYNC_CONCURRENCY", defaults.max_concurrent)?,
            enabled: env_bool("CALBRIDGE_SYNC_ENABLED", true),
        },
        server: ServerConfig {
            bind_addr: std::env::var("CALBRIDGE_BIND_ADDR")
                .unwrap_or_else(|_| ServerConfig::default().bind_addr),
        },
    };

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `CalBridgeError::Config` if no file is found or parsing fails.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CalBridgeError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CalBridgeError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CalBridgeError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, format detected by extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CalBridgeError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CalBridgeError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(CalBridgeError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("calbridge.json"),
            cwd.join("calbridge.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("calbridge.json"),
                exe_dir.join("calbridge.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        CalBridgeError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse a value from an environment variable, defaulting when unset.
fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|e| CalBridgeError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
