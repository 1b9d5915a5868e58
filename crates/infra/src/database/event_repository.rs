//! SQLite-backed implementation of the EventRepository port.

use async_trait::async_trait;
use calbridge_core::EventRepository;
use calbridge_domain::{CalendarEvent, EventDraft, EventPatch, Result};
use chrono::Utc;
use rusqlite::{Row, ToSql};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::manager::SqlitePool;
use crate::errors::InfraError;

const EVENT_COLUMNS: &str = "id, owner_id, title, start_ms, end_ms, all_day, description, \
     location, recurrence_rule, external_uid, source_subscription_id, is_private, \
     created_at_ms, updated_at_ms";

/// SQLite implementation of EventRepository.
pub struct SqliteEventRepository {
    pool: SqlitePool,
}

impl SqliteEventRepository {
    /// Create a new event repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<CalendarEvent> {
    Ok(CalendarEvent {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        start_ms: row.get(3)?,
        end_ms: row.get(4)?,
        all_day: row.get(5)?,
        description: row.get(6)?,
        location: row.get(7)?,
        recurrence_rule: row.get(8)?,
        external_uid: row.get(9)?,
        source_subscription_id: row.get(10)?,
        is_private: row.get(11)?,
        created_at_ms: row.get(12)?,
        updated_at_ms: row.get(13)?,
    })
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    #[instrument(skip(self, draft), fields(owner_id = %draft.owner_id))]
    async fn insert_event(&self, draft: EventDraft) -> Result<CalendarEvent> {
        let conn = self.pool.get().map_err(InfraError::from)?;

        let now_ms = Utc::now().timestamp_millis();
        let event = CalendarEvent {
            id: Uuid::now_v7().to_string(),
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

        conn.execute(
            "INSERT INTO calendar_events (
                id, owner_id, title, start_ms, end_ms, all_day, description,
                location, recurrence_rule, external_uid, source_subscription_id,
                is_private, created_at_ms, updated_at_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            [
                &event.id as &dyn ToSql,
                &event.owner_id,
                &event.title,
                &event.start_ms,
                &event.end_ms,
                &event.all_day,
                &event.description,
                &event.location,
                &event.recurrence_rule,
                &event.external_uid,
                &event.source_subscription_id,
                &event.is_private,
                &event.created_at_ms,
                &event.updated_at_ms,
            ]
            .as_ref(),
        )
        .map_err(InfraError::from)?;

        debug!(event_id = %event.id, "inserted calendar event");
        Ok(event)
    }

    #[instrument(skip(self, patch))]
    async fn update_event(&self, event_id: &str, patch: EventPatch) -> Result<()> {
        let conn = self.pool.get().map_err(InfraError::from)?;

        let now_ms = Utc::now().timestamp_millis();
        conn.execute(
            "UPDATE calendar_events SET
                title = ?1, start_ms = ?2, end_ms = ?3, all_day = ?4,
                description = ?5, location = ?6, recurrence_rule = ?7,
                updated_at_ms = ?8
             WHERE id = ?9",
            [
                &patch.title as &dyn ToSql,
                &patch.start_ms,
                &patch.end_ms,
                &patch.all_day,
                &patch.description,
                &patch.location,
                &patch.recurrence_rule,
                &now_ms,
                &event_id,
            ]
            .as_ref(),
        )
        .map_err(InfraError::from)?;

        Ok(())
    }

    #[instrument(skip(self, event_ids), fields(count = event_ids.len()))]
    async fn delete_events(&self, event_ids: &[String]) -> Result<usize> {
        let mut conn = self.pool.get().map_err(InfraError::from)?;

        let tx = conn.transaction().map_err(InfraError::from)?;
        let mut deleted = 0;
        for event_id in event_ids {
            deleted += tx
                .execute("DELETE FROM calendar_events WHERE id = ?1", [event_id])
                .map_err(InfraError::from)?;
        }
        tx.commit().map_err(InfraError::from)?;

        debug!(deleted, "deleted calendar events");
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn list_for_subscription(
        &self,
        owner_id: &str,
        subscription_id: &str,
    ) -> Result<Vec<CalendarEvent>> {
        let conn = self.pool.get().map_err(InfraError::from)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {EVENT_COLUMNS} FROM calendar_events
                 WHERE owner_id = ?1 AND source_subscription_id = ?2
                 ORDER BY start_ms ASC"
            ))
            .map_err(InfraError::from)?;

        let events = stmt
            .query_map([owner_id, subscription_id], row_to_event)
            .map_err(InfraError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)?;

        Ok(events)
    }

    #[instrument(skip(self))]
    async fn list_for_owner(
        &self,
        owner_id: &str,
        include_private: bool,
        window: Option<(i64, i64)>,
    ) -> Result<Vec<CalendarEvent>> {
        let conn = self.pool.get().map_err(InfraError::from)?;

        let (window_start, window_end) = window.unwrap_or((i64::MIN, i64::MAX));

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {EVENT_COLUMNS} FROM calendar_events
                 WHERE owner_id = ?1
                   AND (?2 OR is_private = 0)
                   AND start_ms >= ?3 AND end_ms <= ?4
                 ORDER BY start_ms ASC"
            ))
            .map_err(InfraError::from)?;

        let events = stmt
            .query_map(
                [
                    &owner_id as &dyn ToSql,
                    &include_private,
                    &window_start,
                    &window_end,
                ]
                .as_ref(),
                row_to_event,
            )
            .map_err(InfraError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)?;

        debug!(owner_id, count = events.len(), "listed events for owner");
        Ok(events)
    }

    #[instrument(skip(self))]
    async fn find_by_external_uid(
        &self,
        owner_id: &str,
        external_uid: &str,
    ) -> Result<Option<CalendarEvent>> {
        let conn = self.pool.get().map_err(InfraError::from)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {EVENT_COLUMNS} FROM calendar_events
                 WHERE owner_id = ?1 AND external_uid = ?2
                 LIMIT 1"
            ))
            .map_err(InfraError::from)?;

        let mut rows =
            stmt.query_map([owner_id, external_uid], row_to_event).map_err(InfraError::from)?;

        match rows.next() {
            Some(row) => Ok(Some(row.map_err(InfraError::from)?)),
            None => Ok(None),
        }
    }
}
