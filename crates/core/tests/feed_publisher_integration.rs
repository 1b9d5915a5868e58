//! Integration tests for the feed publisher: token boundary, conditional
//! responses and access bookkeeping.

mod support;

use std::sync::Arc;

use calbridge_core::feed::publisher::{FeedPublisher, FeedRequest};
use calbridge_core::http_date;
use calbridge_domain::{CalBridgeError, CalendarEvent, FeedToken};
use support::{FixedClock, InMemoryEventRepository, InMemoryFeedTokenRepository};

const NOW_SECS: i64 = 1_705_312_800;

fn token(value: &str, owner_id: &str) -> FeedToken {
    FeedToken {
        token: value.to_string(),
        owner_id: owner_id.to_string(),
        include_private: false,
        is_active: true,
        expires_at_ms: None,
        access_count: 0,
        last_accessed_at_ms: None,
        created_at_ms: 0,
    }
}

fn event(id: &str, owner_id: &str, title: &str, is_private: bool) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        title: title.to_string(),
        start_ms: 1_705_309_200_000,
        end_ms: 1_705_311_000_000,
        all_day: false,
        description: None,
        location: None,
        recurrence_rule: None,
        external_uid: None,
        source_subscription_id: None,
        is_private,
        created_at_ms: 1_705_000_000_000,
        updated_at_ms: 1_705_000_000_000,
    }
}

struct Harness {
    tokens: Arc<InMemoryFeedTokenRepository>,
    events: Arc<InMemoryEventRepository>,
    publisher: FeedPublisher,
}

fn harness() -> Harness {
    let tokens = Arc::new(InMemoryFeedTokenRepository::new());
    let events = Arc::new(InMemoryEventRepository::new());
    let publisher =
        FeedPublisher::new(tokens.clone(), events.clone(), Arc::new(FixedClock::at(NOW_SECS)));
    Harness { tokens, events, publisher }
}

fn request(token: &str) -> FeedRequest<'_> {
    FeedRequest { token, if_none_match: None, if_modified_since: None }
}

#[tokio::test]
async fn valid_token_serves_the_feed_body() {
    let h = harness();
    h.tokens.seed(token("tok-1", "user-1"));
    h.events.seed(event("e1", "user-1", "Standup", false));

    let feed = h.publisher.publish(request("tok-1")).await.unwrap();

    let body = feed.body.expect("body should be rendered");
    assert!(body.contains("BEGIN:VCALENDAR"));
    assert!(body.contains("SUMMARY:Standup"));
    assert!(feed.etag.starts_with('"') && feed.etag.ends_with('"'));
}

#[tokio::test]
async fn missing_token_is_not_found() {
    let h = harness();
    let err = h.publisher.publish(request("nope")).await.unwrap_err();
    assert!(matches!(err, CalBridgeError::NotFound(_)));
}

#[tokio::test]
async fn revoked_token_is_indistinguishable_from_missing() {
    let h = harness();
    let mut revoked = token("tok-1", "user-1");
    revoked.is_active = false;
    h.tokens.seed(revoked);

    let err = h.publisher.publish(request("tok-1")).await.unwrap_err();
    let missing = h.publisher.publish(request("other")).await.unwrap_err();
    assert_eq!(err.to_string(), missing.to_string());
}

#[tokio::test]
async fn expired_token_is_not_found() {
    let h = harness();
    let mut expired = token("tok-1", "user-1");
    expired.expires_at_ms = Some(NOW_SECS * 1000 - 1);
    h.tokens.seed(expired);

    let err = h.publisher.publish(request("tok-1")).await.unwrap_err();
    assert!(matches!(err, CalBridgeError::NotFound(_)));
}

#[tokio::test]
async fn token_expiring_in_the_future_still_works() {
    let h = harness();
    let mut tok = token("tok-1", "user-1");
    tok.expires_at_ms = Some(NOW_SECS * 1000 + 60_000);
    h.tokens.seed(tok);

    assert!(h.publisher.publish(request("tok-1")).await.is_ok());
}

#[tokio::test]
async fn private_events_are_hidden_unless_the_token_allows_them() {
    let h = harness();
    h.tokens.seed(token("public", "user-1"));
    let mut all_access = token("full", "user-1");
    all_access.include_private = true;
    h.tokens.seed(all_access);
    h.events.seed(event("e1", "user-1", "Team lunch", false));
    h.events.seed(event("e2", "user-1", "Therapy", true));

    let public = h.publisher.publish(request("public")).await.unwrap();
    let body = public.body.unwrap();
    assert!(body.contains("Team lunch"));
    assert!(!body.contains("Therapy"));

    let full = h.publisher.publish(request("full")).await.unwrap();
    assert!(full.body.unwrap().contains("Therapy"));
}

#[tokio::test]
async fn serving_a_body_records_exactly_one_access() {
    let h = harness();
    h.tokens.seed(token("tok-1", "user-1"));
    h.events.seed(event("e1", "user-1", "Standup", false));

    h.publisher.publish(request("tok-1")).await.unwrap();

    let record = h.tokens.get_sync("tok-1").unwrap();
    assert_eq!(record.access_count, 1);
    assert_eq!(record.last_accessed_at_ms, Some(NOW_SECS * 1000));
}

#[tokio::test]
async fn matching_etag_yields_not_modified_without_an_access_bump() {
    let h = harness();
    h.tokens.seed(token("tok-1", "user-1"));
    h.events.seed(event("e1", "user-1", "Standup", false));

    let first = h.publisher.publish(request("tok-1")).await.unwrap();
    let etag = first.etag.clone();

    let conditional = FeedRequest {
        token: "tok-1",
        if_none_match: Some(&etag),
        if_modified_since: None,
    };
    let second = h.publisher.publish(conditional).await.unwrap();

    assert!(second.body.is_none());
    assert_eq!(second.etag, etag);
    assert_eq!(h.tokens.get_sync("tok-1").unwrap().access_count, 1);
}

#[tokio::test]
async fn if_modified_since_yields_not_modified_when_nothing_changed() {
    let h = harness();
    h.tokens.seed(token("tok-1", "user-1"));
    h.events.seed(event("e1", "user-1", "Standup", false));

    let first = h.publisher.publish(request("tok-1")).await.unwrap();
    let since = http_date(first.last_modified);

    let conditional = FeedRequest {
        token: "tok-1",
        if_none_match: None,
        if_modified_since: Some(&since),
    };
    let second = h.publisher.publish(conditional).await.unwrap();
    assert!(second.body.is_none());
}

#[tokio::test]
async fn stale_etag_serves_a_fresh_body() {
    let h = harness();
    h.tokens.seed(token("tok-1", "user-1"));
    h.events.seed(event("e1", "user-1", "Standup", false));

    let conditional = FeedRequest {
        token: "tok-1",
        if_none_match: Some("\"0000\""),
        if_modified_since: None,
    };
    let feed = h.publisher.publish(conditional).await.unwrap();
    assert!(feed.body.is_some());
}

#[tokio::test]
async fn empty_calendar_publishes_a_valid_envelope() {
    let h = harness();
    h.tokens.seed(token("tok-1", "user-1"));

    let feed = h.publisher.publish(request("tok-1")).await.unwrap();
    let body = feed.body.unwrap();
    assert!(body.starts_with("BEGIN:VCALENDAR"));
    assert!(body.contains("END:VCALENDAR"));
    assert!(!body.contains("BEGIN:VEVENT"));
}
