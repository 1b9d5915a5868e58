//! Calendar event record and repository parameter types

use serde::{Deserialize, Serialize};

/// A stored calendar event.
///
/// Events created natively have `external_uid` and `source_subscription_id`
/// set to `None`. Events mirrored from a remote feed carry the feed's stable
/// UID plus a back-reference to the owning subscription; the pair
/// (`owner_id`, `source_subscription_id`, `external_uid`) identifies at most
/// one event and is the reconciliation key. The back-reference is a lookup
/// relation, never an ownership edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    /// Start instant, epoch milliseconds.
    pub start_ms: i64,
    /// End instant, epoch milliseconds.
    pub end_ms: i64,
    /// When true, start/end are calendar dates without time-of-day.
    pub all_day: bool,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Raw RRULE value carried through parse → store → generate untouched.
    pub recurrence_rule: Option<String>,
    pub external_uid: Option<String>,
    pub source_subscription_id: Option<String>,
    pub is_private: bool,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

/// Parameters for inserting a new event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDraft {
    pub owner_id: String,
    pub title: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub all_day: bool,
    pub description: Option<String>,
    pub location: Option<String>,
    pub recurrence_rule: Option<String>,
    pub external_uid: Option<String>,
    pub source_subscription_id: Option<String>,
    pub is_private: bool,
}

/// Mutable fields patched onto an existing event during reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPatch {
    pub title: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub all_day: bool,
    pub description: Option<String>,
    pub location: Option<String>,
    pub recurrence_rule: Option<String>,
}

impl EventPatch {
    /// True when applying this patch to `event` would change nothing.
    pub fn matches(&self, event: &CalendarEvent) -> bool {
        self.title == event.title
            && self.start_ms == event.start_ms
            && self.end_ms == event.end_ms
            && self.all_day == event.all_day
            && self.description == event.description
            && self.location == event.location
            && self.recurrence_rule == event.recurrence_rule
    }
}
