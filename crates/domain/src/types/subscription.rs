//! Feed subscription record and its parameter types

use serde::{Deserialize, Serialize};

/// A remote ICS feed a user has attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub owner_id: String,
    pub remote_url: String,
    pub display_name: String,
    pub color: Option<String>,
    pub auto_sync_enabled: bool,
    /// Validators from the most recent successful fetch, used for
    /// conditional re-fetch.
    pub cached_etag: Option<String>,
    pub cached_last_modified: Option<String>,
    pub last_sync_at_ms: Option<i64>,
    pub last_sync_error: Option<String>,
    pub last_sync_counts: SyncCounts,
    pub created_at_ms: i64,
}

/// Add/update/delete counts from one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCounts {
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl SyncCounts {
    /// True when the run changed nothing.
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.updated == 0 && self.deleted == 0
    }
}

/// Parameters for creating a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubscription {
    pub owner_id: String,
    pub remote_url: String,
    pub display_name: String,
    pub color: Option<String>,
    #[serde(default = "default_auto_sync")]
    pub auto_sync_enabled: bool,
}

/// User-editable subscription fields; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionEdit {
    pub remote_url: Option<String>,
    pub display_name: Option<String>,
    pub color: Option<String>,
    pub auto_sync_enabled: Option<bool>,
}

fn default_auto_sync() -> bool {
    true
}
