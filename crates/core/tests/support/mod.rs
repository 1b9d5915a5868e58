//! Shared test helpers for `calbridge-core` integration tests.
//!
//! In-memory implementations of every port so the reconciliation, publisher
//! and transfer suites can focus on behaviour instead of boilerplate.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use calbridge_core::clock::Clock;
use calbridge_core::feed::ports::FeedTokenRepository;
use calbridge_core::sync::ports::{
    EventRepository, FeedFetcher, FetchOutcome, SubscriptionRegistry,
};
use calbridge_domain::{
    CalBridgeError, CalendarEvent, EventDraft, EventPatch, FeedToken, NewFeedToken,
    NewSubscription, Result as DomainResult, Subscription, SubscriptionEdit, SyncCounts,
};
use chrono::{DateTime, TimeZone, Utc};

/// Clock frozen at a fixed instant.
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn at(secs: i64) -> Self {
        Self(Utc.timestamp_opt(secs, 0).single().unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// In-memory event store that counts write calls, so tests can assert the
/// 304 path performs none.
#[derive(Default)]
pub struct InMemoryEventRepository {
    events: Mutex<Vec<CalendarEvent>>,
    next_id: AtomicUsize,
    write_calls: AtomicUsize,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub fn all_events(&self) -> Vec<CalendarEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn seed(&self, event: CalendarEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn insert_event(&self, draft: EventDraft) -> DomainResult<CalendarEvent> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        let now_ms = Utc::now().timestamp_millis();
        let event = CalendarEvent {
            id: format!("event-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            owner_id: draft.owner_id,
            title: draft.title,
            start_ms: draft.start_ms,
            end_ms: draft.end_ms,
            all_day: draft.all_day,
            description: draft.description,
            location: draft.location,
            recurrence_rule: draft.recurrence_rule,
            external_uid: draft.external_uid,
            source_subscription_id: draft.source_subscription_id,
            is_private: draft.is_private,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        };
        self.events.lock().unwrap().push(event.clone());
        Ok(event)
    }

    async fn update_event(&self, event_id: &str, patch: EventPatch) -> DomainResult<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        let mut events = self.events.lock().unwrap();
        let event = events
            .iter_mut()
            .find(|event| event.id == event_id)
            .ok_or_else(|| CalBridgeError::NotFound(format!("event not found: {event_id}")))?;
        event.title = patch.title;
        event.start_ms = patch.start_ms;
        event.end_ms = patch.end_ms;
        event.all_day = patch.all_day;
        event.description = patch.description;
        event.location = patch.location;
        event.recurrence_rule = patch.recurrence_rule;
        event.updated_at_ms = Utc::now().timestamp_millis();
        Ok(())
    }

    async fn delete_events(&self, event_ids: &[String]) -> DomainResult<usize> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        let mut events = self.events.lock().unwrap();
        let before = events.len();
        events.retain(|event| !event_ids.contains(&event.id));
        Ok(before - events.len())
    }

    async fn list_for_subscription(
        &self,
        owner_id: &str,
        subscription_id: &str,
    ) -> DomainResult<Vec<CalendarEvent>> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| {
                event.owner_id == owner_id
                    && event.source_subscription_id.as_deref() == Some(subscription_id)
            })
            .cloned()
            .collect())
    }

    async fn list_for_owner(
        &self,
        owner_id: &str,
        include_private: bool,
        window: Option<(i64, i64)>,
    ) -> DomainResult<Vec<CalendarEvent>> {
        let mut matching: Vec<CalendarEvent> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.owner_id == owner_id)
            .filter(|event| include_private || !event.is_private)
            .filter(|event| {
                window.map_or(true, |(start, end)| {
                    event.start_ms >= start && event.end_ms <= end
                })
            })
            .cloned()
            .collect();
        matching.sort_by_key(|event| event.start_ms);
        Ok(matching)
    }

    async fn find_by_external_uid(
        &self,
        owner_id: &str,
        external_uid: &str,
    ) -> DomainResult<Option<CalendarEvent>> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .find(|event| {
                event.owner_id == owner_id && event.external_uid.as_deref() == Some(external_uid)
            })
            .cloned())
    }
}

/// In-memory subscription registry.
#[derive(Default)]
pub struct InMemorySubscriptionRegistry {
    subscriptions: Mutex<Vec<Subscription>>,
    next_id: AtomicUsize,
}

impl InMemorySubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, subscription: Subscription) {
        self.subscriptions.lock().unwrap().push(subscription);
    }

    pub fn get_sync(&self, id: &str) -> Option<Subscription> {
        self.subscriptions.lock().unwrap().iter().find(|s| s.id == id).cloned()
    }
}

#[async_trait]
impl SubscriptionRegistry for InMemorySubscriptionRegistry {
    async fn create(&self, params: NewSubscription) -> DomainResult<Subscription> {
        let subscription = Subscription {
            id: format!("sub-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            owner_id: params.owner_id,
            remote_url: params.remote_url,
            display_name: params.display_name,
            color: params.color,
            auto_sync_enabled: params.auto_sync_enabled,
            cached_etag: None,
            cached_last_modified: None,
            last_sync_at_ms: None,
            last_sync_error: None,
            last_sync_counts: SyncCounts::default(),
            created_at_ms: Utc::now().timestamp_millis(),
        };
        self.subscriptions.lock().unwrap().push(subscription.clone());
        Ok(subscription)
    }

    async fn get(&self, subscription_id: &str) -> DomainResult<Option<Subscription>> {
        Ok(self.get_sync(subscription_id))
    }

    async fn list_for_owner(&self, owner_id: &str) -> DomainResult<Vec<Subscription>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_due(&self, now_ms: i64, interval_secs: i64) -> DomainResult<Vec<Subscription>> {
        let threshold = now_ms - interval_secs * 1000;
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.auto_sync_enabled)
            .filter(|s| s.last_sync_at_ms.map_or(true, |at| at <= threshold))
            .cloned()
            .collect())
    }

    async fn edit(
        &self,
        subscription_id: &str,
        edit: SubscriptionEdit,
    ) -> DomainResult<Subscription> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let subscription = subscriptions
            .iter_mut()
            .find(|s| s.id == subscription_id)
            .ok_or_else(|| {
                CalBridgeError::NotFound(format!("subscription not found: {subscription_id}"))
            })?;
        if let Some(url) = edit.remote_url {
            subscription.remote_url = url;
        }
        if let Some(name) = edit.display_name {
            subscription.display_name = name;
        }
        if let Some(color) = edit.color {
            subscription.color = Some(color);
        }
        if let Some(enabled) = edit.auto_sync_enabled {
            subscription.auto_sync_enabled = enabled;
        }
        Ok(subscription.clone())
    }

    async fn delete(&self, subscription_id: &str) -> DomainResult<bool> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != subscription_id);
        Ok(subscriptions.len() < before)
    }

    async fn record_sync_success(
        &self,
        subscription_id: &str,
        synced_at_ms: i64,
        counts: SyncCounts,
        etag: Option<String>,
        last_modified: Option<String>,
    ) -> DomainResult<()> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let subscription = subscriptions
            .iter_mut()
            .find(|s| s.id == subscription_id)
            .ok_or_else(|| {
                CalBridgeError::NotFound(format!("subscription not found: {subscription_id}"))
            })?;
        subscription.last_sync_at_ms = Some(synced_at_ms);
        subscription.last_sync_error = None;
        subscription.last_sync_counts = counts;
        subscription.cached_etag = etag;
        subscription.cached_last_modified = last_modified;
        Ok(())
    }

    async fn record_sync_failure(
        &self,
        subscription_id: &str,
        attempted_at_ms: i64,
        error: &str,
    ) -> DomainResult<()> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let subscription = subscriptions
            .iter_mut()
            .find(|s| s.id == subscription_id)
            .ok_or_else(|| {
                CalBridgeError::NotFound(format!("subscription not found: {subscription_id}"))
            })?;
        subscription.last_sync_at_ms = Some(attempted_at_ms);
        subscription.last_sync_error = Some(error.to_string());
        subscription.last_sync_counts = SyncCounts::default();
        Ok(())
    }
}

/// Feed fetcher that replays a scripted sequence of outcomes and records
/// the conditional headers it was asked to send.
#[derive(Default)]
pub struct ScriptedFeedFetcher {
    responses: Mutex<VecDeque<DomainResult<FetchOutcome>>>,
    requests: Mutex<Vec<RecordedFetch>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFetch {
    pub url: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl ScriptedFeedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, outcome: DomainResult<FetchOutcome>) {
        self.responses.lock().unwrap().push_back(outcome);
    }

    pub fn requests(&self) -> Vec<RecordedFetch> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedFetcher for ScriptedFeedFetcher {
    async fn fetch_feed(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> DomainResult<FetchOutcome> {
        self.requests.lock().unwrap().push(RecordedFetch {
            url: url.to_string(),
            etag: etag.map(str::to_string),
            last_modified: last_modified.map(str::to_string),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CalBridgeError::Internal("no scripted response".into())))
    }
}

/// In-memory feed token repository.
#[derive(Default)]
pub struct InMemoryFeedTokenRepository {
    tokens: Mutex<Vec<FeedToken>>,
}

impl InMemoryFeedTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, token: FeedToken) {
        self.tokens.lock().unwrap().push(token);
    }

    pub fn get_sync(&self, token: &str) -> Option<FeedToken> {
        self.tokens.lock().unwrap().iter().find(|t| t.token == token).cloned()
    }
}

#[async_trait]
impl FeedTokenRepository for InMemoryFeedTokenRepository {
    async fn create(&self, params: NewFeedToken) -> DomainResult<FeedToken> {
        let token = FeedToken {
            token: FeedToken::generate_value(),
            owner_id: params.owner_id,
            include_private: params.include_private,
            is_active: true,
            expires_at_ms: params.expires_at_ms,
            access_count: 0,
            last_accessed_at_ms: None,
            created_at_ms: Utc::now().timestamp_millis(),
        };
        self.tokens.lock().unwrap().push(token.clone());
        Ok(token)
    }

    async fn find_by_token(&self, token: &str) -> DomainResult<Option<FeedToken>> {
        Ok(self.get_sync(token))
    }

    async fn list_for_owner(&self, owner_id: &str) -> DomainResult<Vec<FeedToken>> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn record_access(&self, token: &str, accessed_at_ms: i64) -> DomainResult<()> {
        let mut tokens = self.tokens.lock().unwrap();
        let record = tokens
            .iter_mut()
            .find(|t| t.token == token)
            .ok_or_else(|| CalBridgeError::NotFound("feed token not found".into()))?;
        record.access_count += 1;
        record.last_accessed_at_ms = Some(accessed_at_ms);
        Ok(())
    }

    async fn revoke(&self, token: &str, owner_id: &str) -> DomainResult<bool> {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.iter_mut().find(|t| t.token == token && t.owner_id == owner_id) {
            Some(record) => {
                record.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// A subscription fixture pointing at `url`.
pub fn subscription(id: &str, owner_id: &str, url: &str) -> Subscription {
    Subscription {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        remote_url: url.to_string(),
        display_name: "Test feed".to_string(),
        color: None,
        auto_sync_enabled: true,
        cached_etag: None,
        cached_last_modified: None,
        last_sync_at_ms: None,
        last_sync_error: None,
        last_sync_counts: SyncCounts::default(),
        created_at_ms: 0,
    }
}

/// Build an ICS document from `(uid, summary)` pairs with one-hour events.
pub fn ics_feed(entries: &[(&str, &str)]) -> String {
    let mut out = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n");
    for (index, (uid, summary)) in entries.iter().enumerate() {
        let hour = 9 + index;
        out.push_str(&format!(
            "BEGIN:VEVENT\r\nUID:{uid}\r\nSUMMARY:{summary}\r\nDTSTART:20240115T{hour:02}0000Z\r\nDTEND:20240115T{hour:02}3000Z\r\nEND:VEVENT\r\n",
        ));
    }
    out.push_str("END:VCALENDAR\r\n");
    out
}
