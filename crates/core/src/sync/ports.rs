//! Port interfaces for feed synchronization
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use calbridge_domain::{
    CalendarEvent, EventDraft, EventPatch, NewSubscription, Result, Subscription,
    SubscriptionEdit, SyncCounts,
};

/// Outcome of a conditional feed fetch.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The remote answered `304 Not Modified`; nothing further to do.
    NotModified,
    /// A fresh body, with whatever validators the remote supplied.
    Fetched {
        body: String,
        etag: Option<String>,
        last_modified: Option<String>,
    },
}

/// Trait for fetching a remote ICS feed with conditional-request support.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Issue a conditional GET against `url`.
    ///
    /// `etag`/`last_modified` are the validators cached from the previous
    /// successful fetch and are sent as `If-None-Match` /
    /// `If-Modified-Since` when present. Non-2xx/non-304 statuses and
    /// transport failures are errors.
    async fn fetch_feed(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Result<FetchOutcome>;
}

/// Trait for persisting calendar events.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert a new event and return the stored record.
    async fn insert_event(&self, draft: EventDraft) -> Result<CalendarEvent>;

    /// Patch the mutable fields of an existing event.
    async fn update_event(&self, event_id: &str, patch: EventPatch) -> Result<()>;

    /// Delete events by id, returning the number removed.
    async fn delete_events(&self, event_ids: &[String]) -> Result<usize>;

    /// All events mirrored from one subscription.
    async fn list_for_subscription(
        &self,
        owner_id: &str,
        subscription_id: &str,
    ) -> Result<Vec<CalendarEvent>>;

    /// An owner's events ordered by start time. Private events are filtered
    /// out unless `include_private`; `window` bounds start/end instants
    /// (epoch ms) when present.
    async fn list_for_owner(
        &self,
        owner_id: &str,
        include_private: bool,
        window: Option<(i64, i64)>,
    ) -> Result<Vec<CalendarEvent>>;

    /// Look up an owner's event by its external UID, regardless of which
    /// subscription (if any) it came from.
    async fn find_by_external_uid(
        &self,
        owner_id: &str,
        external_uid: &str,
    ) -> Result<Option<CalendarEvent>>;
}

/// Trait for the durable record of feed subscriptions.
#[async_trait]
pub trait SubscriptionRegistry: Send + Sync {
    /// Create a subscription.
    async fn create(&self, params: NewSubscription) -> Result<Subscription>;

    /// Fetch one subscription by id.
    async fn get(&self, subscription_id: &str) -> Result<Option<Subscription>>;

    /// All subscriptions belonging to an owner.
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Subscription>>;

    /// Subscriptions due for a sync: auto-sync enabled and last attempted
    /// more than `interval_secs` before `now_ms` (or never).
    async fn list_due(&self, now_ms: i64, interval_secs: i64) -> Result<Vec<Subscription>>;

    /// Apply user edits to a subscription.
    async fn edit(&self, subscription_id: &str, edit: SubscriptionEdit) -> Result<Subscription>;

    /// Delete a subscription, cascading to every event whose
    /// `source_subscription_id` matches. Returns false when absent.
    async fn delete(&self, subscription_id: &str) -> Result<bool>;

    /// Record a successful sync attempt: timestamp, counts and the response
    /// validators to use for the next conditional fetch.
    async fn record_sync_success(
        &self,
        subscription_id: &str,
        synced_at_ms: i64,
        counts: SyncCounts,
        etag: Option<String>,
        last_modified: Option<String>,
    ) -> Result<()>;

    /// Record a failed sync attempt. Cached validators are left untouched
    /// so the next attempt still benefits from conditional fetch.
    async fn record_sync_failure(
        &self,
        subscription_id: &str,
        attempted_at_ms: i64,
        error: &str,
    ) -> Result<()>;
}
