//! SQLite-backed persistence.

pub mod feed_token_repository;
pub mod manager;
pub mod event_repository;
pub mod subscription_repository;

pub use feed_token_repository::SqliteFeedTokenRepository;
pub use manager::{DbManager, SqlitePool};
pub use event_repository::SqliteEventRepository;
pub use subscription_repository::SqliteSubscriptionRegistry;
