//! Conditional cache codec.
//!
//! Computes the validators (`ETag`, `Last-Modified`) for the exact ordered
//! event set a feed would render, and evaluates client-supplied validators
//! against them. The fingerprint covers every field that reaches the wire,
//! so the ETag changes if and only if the rendered content would change.

use calbridge_domain::utils::ics::wire_uid;
use calbridge_domain::CalendarEvent;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Validators describing one rendering of a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedValidators {
    /// Opaque quoted content fingerprint.
    pub etag: String,
    /// Maximum last-mutation instant across the set, truncated to whole
    /// seconds (HTTP dates carry no sub-second precision).
    pub last_modified: DateTime<Utc>,
}

/// Compute validators for `events`. An empty set falls back to `now` for
/// `Last-Modified`.
pub fn compute_validators(events: &[CalendarEvent], now: DateTime<Utc>) -> FeedValidators {
    let mut hasher = Sha256::new();
    for event in events {
        // The internal id only reaches the wire through the resolved UID.
        hash_field(&mut hasher, &wire_uid(event));
        hash_field(&mut hasher, &event.title);
        hasher.update(event.start_ms.to_le_bytes());
        hasher.update(event.end_ms.to_le_bytes());
        hasher.update([u8::from(event.all_day)]);
        hash_field(&mut hasher, event.description.as_deref().unwrap_or(""));
        hash_field(&mut hasher, event.location.as_deref().unwrap_or(""));
        hash_field(&mut hasher, event.recurrence_rule.as_deref().unwrap_or(""));
    }

    let digest = hasher.finalize();
    let etag = format!("\"{}\"", hex::encode(&digest[..16]));

    let last_modified = events
        .iter()
        .map(|event| event.updated_at_ms)
        .max()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or(now);
    let last_modified = truncate_to_second(last_modified);

    FeedValidators { etag, last_modified }
}

/// Decide whether a request carrying these validators can be answered with
/// `304 Not Modified`. Either validator matching is sufficient.
pub fn is_not_modified(
    validators: &FeedValidators,
    if_none_match: Option<&str>,
    if_modified_since: Option<&str>,
) -> bool {
    if let Some(candidate) = if_none_match {
        if candidate.trim() == validators.etag {
            return true;
        }
    }

    if let Some(since) = if_modified_since.and_then(parse_http_date) {
        if validators.last_modified <= since {
            return true;
        }
    }

    false
}

/// Format an instant as an RFC 7231 HTTP date (`Last-Modified` style).
pub fn http_date(instant: DateTime<Utc>) -> String {
    instant.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    // IMF-fixdate is RFC 2822-compatible apart from the GMT zone name.
    DateTime::parse_from_rfc2822(&value.trim().replace("GMT", "+0000"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn truncate_to_second(instant: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(instant.timestamp(), 0).unwrap_or(instant)
}

fn hash_field(hasher: &mut Sha256, value: &str) {
    hasher.update(value.as_bytes());
    // Separator prevents adjacent fields from colliding.
    hasher.update([0u8]);
}
