//! # CalBridge Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits)
//! - The reconciliation engine, feed publisher and import/export services
//! - The conditional cache codec
//!
//! ## Architecture Principles
//! - Only depends on `calbridge-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod clock;
pub mod feed;
pub mod sync;
pub mod transfer;

// Re-export specific items to avoid ambiguity
pub use clock::Clock;
pub use feed::cache::{compute_validators, http_date, is_not_modified, FeedValidators};
pub use feed::ports::FeedTokenRepository;
pub use feed::publisher::{FeedPublisher, FeedRequest, PublishedFeed};
pub use sync::ports::{
    EventRepository, FeedFetcher, FetchOutcome, SubscriptionRegistry,
};
pub use sync::service::{SyncOutcome, SyncService};
pub use transfer::service::{ImportOutcome, TransferService};
