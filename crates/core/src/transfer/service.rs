//! Import/export service.
//!
//! Imports are one-shot rather than recurring, so duplicate suppression is
//! a plain existence check on the external UID instead of the full
//! subscription reconciliation.

use std::sync::Arc;

use calbridge_domain::utils::ics::{generate_ics, parse_ics, IcsCalendarOptions};
use calbridge_domain::{EventDraft, Result};
use tracing::{info, instrument};

use crate::clock::Clock;
use crate::sync::ports::EventRepository;

/// Counts from one import run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOutcome {
    pub imported: usize,
    pub skipped: usize,
}

/// One-shot ICS import and windowed export.
pub struct TransferService {
    events: Arc<dyn EventRepository>,
    clock: Arc<dyn Clock>,
}

impl TransferService {
    /// Create a new transfer service.
    pub fn new(events: Arc<dyn EventRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { events, clock }
    }

    /// Import ICS text into an owner's calendar.
    ///
    /// Events whose external UID already exists for the owner are skipped.
    #[instrument(skip(self, ical_data), fields(bytes = ical_data.len()))]
    pub async fn import_ics(&self, owner_id: &str, ical_data: &str) -> Result<ImportOutcome> {
        let parsed = parse_ics(ical_data);

        let mut outcome = ImportOutcome::default();
        for event in parsed {
            if self.events.find_by_external_uid(owner_id, &event.uid).await?.is_some() {
                outcome.skipped += 1;
                continue;
            }

            self.events
                .insert_event(EventDraft {
                    owner_id: owner_id.to_string(),
                    title: event.title,
                    start_ms: event.start_ms,
                    end_ms: event.end_ms,
                    all_day: event.all_day,
                    description: event.description,
                    location: event.location,
                    recurrence_rule: event.recurrence_rule,
                    external_uid: Some(event.uid),
                    source_subscription_id: None,
                    is_private: false,
                })
                .await?;
            outcome.imported += 1;
        }

        info!(owner_id, imported = outcome.imported, skipped = outcome.skipped, "ICS import completed");
        Ok(outcome)
    }

    /// Export an owner's events (private ones included - the owner is
    /// exporting their own calendar) as an ICS document.
    #[instrument(skip(self))]
    pub async fn export_ics(
        &self,
        owner_id: &str,
        window: Option<(i64, i64)>,
        calendar_name: Option<String>,
    ) -> Result<String> {
        let events = self.events.list_for_owner(owner_id, true, window).await?;
        let options = IcsCalendarOptions { calendar_name };
        Ok(generate_ics(&events, &options, self.clock.now()))
    }
}
