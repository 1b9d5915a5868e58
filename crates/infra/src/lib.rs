//! # CalBridge Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite-backed repositories (events, subscriptions, feed tokens)
//! - The HTTP feed fetcher with conditional-request support
//! - The cron-based sync scheduler
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `calbridge-core`
//! - Depends on `calbridge-domain` and `calbridge-core`
//! - Contains all "impure" code (I/O, database, network)

pub mod clock;
pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod scheduling;

// Re-export commonly used items
pub use clock::SystemClock;
pub use database::feed_token_repository::SqliteFeedTokenRepository;
pub use database::manager::{DbManager, SqlitePool};
pub use database::event_repository::SqliteEventRepository;
pub use database::subscription_repository::SqliteSubscriptionRegistry;
pub use errors::InfraError;
pub use http::client::HttpClient;
pub use http::feed_fetcher::HttpFeedFetcher;
pub use scheduling::{FeedSyncScheduler, FeedSyncSchedulerConfig, SchedulerError, SchedulerResult};
