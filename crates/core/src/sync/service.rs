//! Feed reconciliation engine.
//!
//! Orchestrates one subscription's sync attempt: conditional fetch → parse →
//! three-way diff against the event store → persist sync metadata. A `304`
//! from the remote short-circuits before any event-store access, which is
//! the steady-state path at the scheduler's cadence.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use calbridge_domain::utils::ics::{parse_ics, ParsedIcsEvent};
use calbridge_domain::{
    CalBridgeError, CalendarEvent, EventDraft, EventPatch, Result, Subscription, SyncCounts,
};
use tracing::{debug, info, instrument, warn};

use super::ports::{EventRepository, FeedFetcher, FetchOutcome, SubscriptionRegistry};
use crate::clock::Clock;

/// Result of one sync attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOutcome {
    pub counts: SyncCounts,
    /// True when the remote answered `304 Not Modified`.
    pub not_modified: bool,
}

/// Reconciliation engine for feed subscriptions.
pub struct SyncService {
    fetcher: Arc<dyn FeedFetcher>,
    events: Arc<dyn EventRepository>,
    subscriptions: Arc<dyn SubscriptionRegistry>,
    clock: Arc<dyn Clock>,
}

impl SyncService {
    /// Create a new sync service.
    pub fn new(
        fetcher: Arc<dyn FeedFetcher>,
        events: Arc<dyn EventRepository>,
        subscriptions: Arc<dyn SubscriptionRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { fetcher, events, subscriptions, clock }
    }

    /// Synchronize one subscription.
    ///
    /// Failures at any stage are recorded on the subscription's sync
    /// metadata before being returned; previously cached validators survive
    /// a failed attempt.
    #[instrument(skip(self))]
    pub async fn sync_subscription(&self, subscription_id: &str) -> Result<SyncOutcome> {
        let subscription = self
            .subscriptions
            .get(subscription_id)
            .await?
            .ok_or_else(|| {
                CalBridgeError::NotFound(format!("subscription not found: {subscription_id}"))
            })?;

        match self.run_sync(&subscription).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                let attempted_at = self.clock.now_ms();
                if let Err(record_err) = self
                    .subscriptions
                    .record_sync_failure(&subscription.id, attempted_at, &err.to_string())
                    .await
                {
                    warn!(
                        subscription_id = %subscription.id,
                        error = %record_err,
                        "failed to record sync failure"
                    );
                }
                Err(err)
            }
        }
    }

    async fn run_sync(&self, subscription: &Subscription) -> Result<SyncOutcome> {
        let fetched = self
            .fetcher
            .fetch_feed(
                &subscription.remote_url,
                subscription.cached_etag.as_deref(),
                subscription.cached_last_modified.as_deref(),
            )
            .await?;

        match fetched {
            FetchOutcome::NotModified => {
                debug!(subscription_id = %subscription.id, "feed not modified, skipping reconciliation");
                self.subscriptions
                    .record_sync_success(
                        &subscription.id,
                        self.clock.now_ms(),
                        SyncCounts::default(),
                        subscription.cached_etag.clone(),
                        subscription.cached_last_modified.clone(),
                    )
                    .await?;
                Ok(SyncOutcome { counts: SyncCounts::default(), not_modified: true })
            }
            FetchOutcome::Fetched { body, etag, last_modified } => {
                let parsed = parse_ics(&body);
                let counts = self.reconcile(subscription, &parsed).await?;

                self.subscriptions
                    .record_sync_success(
                        &subscription.id,
                        self.clock.now_ms(),
                        counts,
                        etag,
                        last_modified,
                    )
                    .await?;

                info!(
                    subscription_id = %subscription.id,
                    added = counts.added,
                    updated = counts.updated,
                    deleted = counts.deleted,
                    "subscription reconciled"
                );

                Ok(SyncOutcome { counts, not_modified: false })
            }
        }
    }

    /// Three-way diff of the parsed feed against the stored event set.
    ///
    /// Known UID → patch when changed (updated); unknown UID → insert
    /// (added); stored UID absent from the feed → delete (deleted). Running
    /// the diff twice against an unchanged feed yields zero net changes.
    async fn reconcile(
        &self,
        subscription: &Subscription,
        parsed: &[ParsedIcsEvent],
    ) -> Result<SyncCounts> {
        let stored = self
            .events
            .list_for_subscription(&subscription.owner_id, &subscription.id)
            .await?;

        let by_uid: HashMap<&str, &CalendarEvent> = stored
            .iter()
            .filter_map(|event| event.external_uid.as_deref().map(|uid| (uid, event)))
            .collect();

        let mut counts = SyncCounts::default();
        let mut seen: HashSet<&str> = HashSet::with_capacity(parsed.len());

        for event in parsed {
            // First occurrence wins when a feed repeats a UID.
            if !seen.insert(event.uid.as_str()) {
                continue;
            }

            if let Some(existing) = by_uid.get(event.uid.as_str()) {
                let patch = Self::patch_from(event);
                if !patch.matches(existing) {
                    self.events.update_event(&existing.id, patch).await?;
                    counts.updated += 1;
                }
            } else {
                self.events.insert_event(Self::draft_from(subscription, event)).await?;
                counts.added += 1;
            }
        }

        let stale: Vec<String> = stored
            .iter()
            .filter(|event| {
                event.external_uid.as_deref().map_or(true, |uid| !seen.contains(uid))
            })
            .map(|event| event.id.clone())
            .collect();

        if !stale.is_empty() {
            counts.deleted = self.events.delete_events(&stale).await?;
        }

        Ok(counts)
    }

    fn patch_from(event: &ParsedIcsEvent) -> EventPatch {
        EventPatch {
            title: event.title.clone(),
            start_ms: event.start_ms,
            end_ms: event.end_ms,
            all_day: event.all_day,
            description: event.description.clone(),
            location: event.location.clone(),
            recurrence_rule: event.recurrence_rule.clone(),
        }
    }

    fn draft_from(subscription: &Subscription, event: &ParsedIcsEvent) -> EventDraft {
        EventDraft {
            owner_id: subscription.owner_id.clone(),
            title: event.title.clone(),
            start_ms: event.start_ms,
            end_ms: event.end_ms,
            all_day: event.all_day,
            description: event.description.clone(),
            location: event.location.clone(),
            recurrence_rule: event.recurrence_rule.clone(),
            external_uid: Some(event.uid.clone()),
            source_subscription_id: Some(subscription.id.clone()),
            is_private: false,
        }
    }
}
