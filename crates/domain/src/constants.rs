//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// ICS generation
pub const ICS_PRODID: &str = "-//CalBridge//CalBridge Calendar//EN";
pub const ICS_VERSION: &str = "2.0";
pub const DEFAULT_EVENT_TITLE: &str = "Untitled Event";

// Defaults applied when a feed omits DTEND
pub const DEFAULT_TIMED_DURATION_MS: i64 = 60 * 60 * 1000;
pub const DEFAULT_ALL_DAY_DURATION_MS: i64 = 24 * 60 * 60 * 1000;

// Sync cadence
pub const DEFAULT_SYNC_CRON: &str = "0 */5 * * * *"; // every 5 minutes
pub const DEFAULT_SYNC_INTERVAL_SECS: i64 = 300;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SYNC_CONCURRENCY: usize = 4;

// Feed publishing
pub const FEED_CACHE_MAX_AGE_SECS: u64 = 300;
pub const FEED_TOKEN_LENGTH: usize = 32;
