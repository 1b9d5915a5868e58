//! Application configuration structures

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_SYNC_CONCURRENCY, DEFAULT_SYNC_CRON,
    DEFAULT_SYNC_INTERVAL_SECS,
};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// Feed synchronization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_cron")]
    pub cron_expression: String,
    /// A subscription is "due" once this many seconds have passed since its
    /// last sync attempt.
    #[serde(default = "default_interval")]
    pub interval_secs: i64,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_concurrency")]
    pub max_concurrent: usize,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cron_expression: default_cron(),
            interval_secs: default_interval(),
            fetch_timeout_secs: default_fetch_timeout(),
            max_concurrent: default_concurrency(),
            enabled: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: default_bind_addr() }
    }
}

fn default_pool_size() -> u32 {
    4
}

fn default_cron() -> String {
    DEFAULT_SYNC_CRON.to_string()
}

fn default_interval() -> i64 {
    DEFAULT_SYNC_INTERVAL_SECS
}

fn default_fetch_timeout() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_concurrency() -> usize {
    DEFAULT_SYNC_CONCURRENCY
}

fn default_enabled() -> bool {
    true
}

fn default_bind_addr() -> String {
    "127.0.0.1:8787".to_string()
}
