//! Port interface for feed token storage

use async_trait::async_trait;
use calbridge_domain::{FeedToken, NewFeedToken, Result};

/// Trait for the durable record of feed tokens.
#[async_trait]
pub trait FeedTokenRepository: Send + Sync {
    /// Issue a token. The implementation generates the opaque value; it is
    /// returned here and never shown again.
    async fn create(&self, params: NewFeedToken) -> Result<FeedToken>;

    /// Look up a token by its value.
    async fn find_by_token(&self, token: &str) -> Result<Option<FeedToken>>;

    /// All tokens issued to an owner, revoked ones included.
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<FeedToken>>;

    /// Bump the access counter and stamp the access instant.
    async fn record_access(&self, token: &str, accessed_at_ms: i64) -> Result<()>;

    /// Soft-revoke a token (`is_active = false`). Returns false when the
    /// owner holds no such token.
    async fn revoke(&self, token: &str, owner_id: &str) -> Result<bool>;
}
