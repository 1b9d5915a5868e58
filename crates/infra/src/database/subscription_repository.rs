//! SQLite-backed implementation of the SubscriptionRegistry port.

use async_trait::async_trait;
use calbridge_core::SubscriptionRegistry;
use calbridge_domain::{NewSubscription, Result, Subscription, SubscriptionEdit, SyncCounts};
use chrono::Utc;
use rusqlite::{Row, ToSql};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::manager::SqlitePool;
use crate::errors::InfraError;

const SUBSCRIPTION_COLUMNS: &str = "id, owner_id, remote_url, display_name, color, \
     auto_sync_enabled, cached_etag, cached_last_modified, last_sync_at_ms, last_sync_error, \
     last_sync_added, last_sync_updated, last_sync_deleted, created_at_ms";

/// SQLite implementation of SubscriptionRegistry.
pub struct SqliteSubscriptionRegistry {
    pool: SqlitePool,
}

impl SqliteSubscriptionRegistry {
    /// Create a new subscription registry.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_subscription(row: &Row<'_>) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        remote_url: row.get(2)?,
        display_name: row.get(3)?,
        color: row.get(4)?,
        auto_sync_enabled: row.get(5)?,
        cached_etag: row.get(6)?,
        cached_last_modified: row.get(7)?,
        last_sync_at_ms: row.get(8)?,
        last_sync_error: row.get(9)?,
        last_sync_counts: SyncCounts {
            added: row.get::<_, i64>(10)? as usize,
            updated: row.get::<_, i64>(11)? as usize,
            deleted: row.get::<_, i64>(12)? as usize,
        },
        created_at_ms: row.get(13)?,
    })
}

#[async_trait]
impl SubscriptionRegistry for SqliteSubscriptionRegistry {
    #[instrument(skip(self, params), fields(owner_id = %params.owner_id))]
    async fn create(&self, params: NewSubscription) -> Result<Subscription> {
        let conn = self.pool.get().map_err(InfraError::from)?;

        let subscription = Subscription {
            id: Uuid::now_v7().to_string(),
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

        conn.execute(
            "INSERT INTO subscriptions (
                id, owner_id, remote_url, display_name, color, auto_sync_enabled, created_at_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            [
                &subscription.id as &dyn ToSql,
                &subscription.owner_id,
                &subscription.remote_url,
                &subscription.display_name,
                &subscription.color,
                &subscription.auto_sync_enabled,
                &subscription.created_at_ms,
            ]
            .as_ref(),
        )
        .map_err(InfraError::from)?;

        debug!(subscription_id = %subscription.id, "created subscription");
        Ok(subscription)
    }

    #[instrument(skip(self))]
    async fn get(&self, subscription_id: &str) -> Result<Option<Subscription>> {
        let conn = self.pool.get().map_err(InfraError::from)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = ?1"
            ))
            .map_err(InfraError::from)?;

        let mut rows =
            stmt.query_map([subscription_id], row_to_subscription).map_err(InfraError::from)?;

        match rows.next() {
            Some(row) => Ok(Some(row.map_err(InfraError::from)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Subscription>> {
        let conn = self.pool.get().map_err(InfraError::from)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
                 WHERE owner_id = ?1 ORDER BY created_at_ms ASC"
            ))
            .map_err(InfraError::from)?;

        let subscriptions = stmt
            .query_map([owner_id], row_to_subscription)
            .map_err(InfraError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)?;

        Ok(subscriptions)
    }

    #[instrument(skip(self))]
    async fn list_due(&self, now_ms: i64, interval_secs: i64) -> Result<Vec<Subscription>> {
        let conn = self.pool.get().map_err(InfraError::from)?;

        let threshold = now_ms - interval_secs * 1000;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
                 WHERE auto_sync_enabled = 1
                   AND (last_sync_at_ms IS NULL OR last_sync_at_ms <= ?1)
                 ORDER BY last_sync_at_ms ASC"
            ))
            .map_err(InfraError::from)?;

        let due = stmt
            .query_map([threshold], row_to_subscription)
            .map_err(InfraError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)?;

        debug!(count = due.len(), "listed due subscriptions");
        Ok(due)
    }

    #[instrument(skip(self, edit))]
    async fn edit(&self, subscription_id: &str, edit: SubscriptionEdit) -> Result<Subscription> {
        let conn = self.pool.get().map_err(InfraError::from)?;

        conn.execute(
            "UPDATE subscriptions SET
                remote_url = COALESCE(?1, remote_url),
                display_name = COALESCE(?2, display_name),
                color = COALESCE(?3, color),
                auto_sync_enabled = COALESCE(?4, auto_sync_enabled)
             WHERE id = ?5",
            [
                &edit.remote_url as &dyn ToSql,
                &edit.display_name,
                &edit.color,
                &edit.auto_sync_enabled,
                &subscription_id,
            ]
            .as_ref(),
        )
        .map_err(InfraError::from)?;

        drop(conn);
        self.get(subscription_id).await?.ok_or_else(|| {
            calbridge_domain::CalBridgeError::NotFound(format!(
                "subscription not found: {subscription_id}"
            ))
        })
    }

    #[instrument(skip(self))]
    async fn delete(&self, subscription_id: &str) -> Result<bool> {
        let conn = self.pool.get().map_err(InfraError::from)?;

        // Mirrored events go with it via the FK cascade.
        let deleted = conn
            .execute("DELETE FROM subscriptions WHERE id = ?1", [subscription_id])
            .map_err(InfraError::from)?;

        debug!(subscription_id, deleted, "deleted subscription");
        Ok(deleted > 0)
    }

    #[instrument(skip(self, etag, last_modified))]
    async fn record_sync_success(
        &self,
        subscription_id: &str,
        synced_at_ms: i64,
        counts: SyncCounts,
        etag: Option<String>,
        last_modified: Option<String>,
    ) -> Result<()> {
        let conn = self.pool.get().map_err(InfraError::from)?;

        conn.execute(
            "UPDATE subscriptions SET
                last_sync_at_ms = ?1, last_sync_error = NULL,
                last_sync_added = ?2, last_sync_updated = ?3, last_sync_deleted = ?4,
                cached_etag = ?5, cached_last_modified = ?6
             WHERE id = ?7",
            [
                &synced_at_ms as &dyn ToSql,
                &(counts.added as i64),
                &(counts.updated as i64),
                &(counts.deleted as i64),
                &etag,
                &last_modified,
                &subscription_id,
            ]
            .as_ref(),
        )
        .map_err(InfraError::from)?;

        Ok(())
    }

    #[instrument(skip(self, error))]
    async fn record_sync_failure(
        &self,
        subscription_id: &str,
        attempted_at_ms: i64,
        error: &str,
    ) -> Result<()> {
        let conn = self.pool.get().map_err(InfraError::from)?;

        // Cached validators are deliberately left alone.
        conn.execute(
            "UPDATE subscriptions SET
                last_sync_at_ms = ?1, last_sync_error = ?2,
                last_sync_added = 0, last_sync_updated = 0, last_sync_deleted = 0
             WHERE id = ?3",
            [&attempted_at_ms as &dyn ToSql, &error, &subscription_id].as_ref(),
        )
        .map_err(InfraError::from)?;

        Ok(())
    }
}
