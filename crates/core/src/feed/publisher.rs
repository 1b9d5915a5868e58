//! Feed publisher.
//!
//! Serves a token-scoped ICS export of a user's own events with conditional
//! cache semantics. Missing, revoked and expired tokens all collapse into
//! the same `NotFound` so token existence never leaks.

use std::sync::Arc;

use calbridge_domain::utils::ics::{generate_ics, IcsCalendarOptions};
use calbridge_domain::{CalBridgeError, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use super::cache::{compute_validators, is_not_modified};
use super::ports::FeedTokenRepository;
use crate::clock::Clock;
use crate::sync::ports::EventRepository;

/// One feed request, as seen by the publisher.
#[derive(Debug, Clone, Copy)]
pub struct FeedRequest<'a> {
    pub token: &'a str,
    pub if_none_match: Option<&'a str>,
    pub if_modified_since: Option<&'a str>,
}

/// A published feed response.
///
/// `body` is `None` when the client's validators matched; access
/// bookkeeping is only touched when a body is served.
#[derive(Debug, Clone)]
pub struct PublishedFeed {
    pub body: Option<String>,
    pub etag: String,
    pub last_modified: DateTime<Utc>,
}

/// Serves token-scoped ICS feeds.
pub struct FeedPublisher {
    tokens: Arc<dyn FeedTokenRepository>,
    events: Arc<dyn EventRepository>,
    clock: Arc<dyn Clock>,
    calendar_name: String,
}

impl FeedPublisher {
    /// Create a new publisher.
    pub fn new(
        tokens: Arc<dyn FeedTokenRepository>,
        events: Arc<dyn EventRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { tokens, events, clock, calendar_name: "CalBridge".to_string() }
    }

    /// Override the calendar display name emitted as `X-WR-CALNAME`.
    pub fn with_calendar_name(mut self, name: impl Into<String>) -> Self {
        self.calendar_name = name.into();
        self
    }

    /// Resolve the token, evaluate validators and render the feed.
    #[instrument(skip(self, request), fields(token_len = request.token.len()))]
    pub async fn publish(&self, request: FeedRequest<'_>) -> Result<PublishedFeed> {
        let now = self.clock.now();

        let token = self
            .tokens
            .find_by_token(request.token)
            .await?
            .filter(|token| token.is_usable(now.timestamp_millis()))
            .ok_or_else(|| CalBridgeError::NotFound("feed not found".into()))?;

        let events = self
            .events
            .list_for_owner(&token.owner_id, token.include_private, None)
            .await?;

        let validators = compute_validators(&events, now);

        if is_not_modified(&validators, request.if_none_match, request.if_modified_since) {
            debug!(owner_id = %token.owner_id, "feed validators matched, serving 304");
            return Ok(PublishedFeed {
                body: None,
                etag: validators.etag,
                last_modified: validators.last_modified,
            });
        }

        let options = IcsCalendarOptions { calendar_name: Some(self.calendar_name.clone()) };
        let body = generate_ics(&events, &options, now);

        self.tokens.record_access(&token.token, now.timestamp_millis()).await?;

        Ok(PublishedFeed {
            body: Some(body),
            etag: validators.etag,
            last_modified: validators.last_modified,
        })
    }
}
