//! SQLite-backed implementation of the FeedTokenRepository port.

use async_trait::async_trait;
use calbridge_core::FeedTokenRepository;
use calbridge_domain::{FeedToken, NewFeedToken, Result};
use chrono::Utc;
use rusqlite::{Row, ToSql};
use tracing::{debug, instrument};

use super::manager::SqlitePool;
use crate::errors::InfraError;

const TOKEN_COLUMNS: &str = "token, owner_id, include_private, is_active, expires_at_ms, \
     access_count, last_accessed_at_ms, created_at_ms";

/// SQLite implementation of FeedTokenRepository.
pub struct SqliteFeedTokenRepository {
    pool: SqlitePool,
}

impl SqliteFeedTokenRepository {
    /// Create a new feed token repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_token(row: &Row<'_>) -> rusqlite::Result<FeedToken> {
    Ok(FeedToken {
        token: row.get(0)?,
        owner_id: row.get(1)?,
        include_private: row.get(2)?,
        is_active: row.get(3)?,
        expires_at_ms: row.get(4)?,
        access_count: row.get(5)?,
        last_accessed_at_ms: row.get(6)?,
        created_at_ms: row.get(7)?,
    })
}

#[async_trait]
impl FeedTokenRepository for SqliteFeedTokenRepository {
    #[instrument(skip(self, params), fields(owner_id = %params.owner_id))]
    async fn create(&self, params: NewFeedToken) -> Result<FeedToken> {
        let conn = self.pool.get().map_err(InfraError::from)?;

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

        conn.execute(
            "INSERT INTO feed_tokens (
                token, owner_id, include_private, is_active, expires_at_ms,
                access_count, last_accessed_at_ms, created_at_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            [
                &token.token as &dyn ToSql,
                &token.owner_id,
                &token.include_private,
                &token.is_active,
                &token.expires_at_ms,
                &token.access_count,
                &token.last_accessed_at_ms,
                &token.created_at_ms,
            ]
            .as_ref(),
        )
        .map_err(InfraError::from)?;

        debug!(owner_id = %token.owner_id, "issued feed token");
        Ok(token)
    }

    #[instrument(skip_all)]
    async fn find_by_token(&self, token: &str) -> Result<Option<FeedToken>> {
        let conn = self.pool.get().map_err(InfraError::from)?;

        let mut stmt = conn
            .prepare(&format!("SELECT {TOKEN_COLUMNS} FROM feed_tokens WHERE token = ?1"))
            .map_err(InfraError::from)?;

        let mut rows = stmt.query_map([token], row_to_token).map_err(InfraError::from)?;

        match rows.next() {
            Some(row) => Ok(Some(row.map_err(InfraError::from)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<FeedToken>> {
        let conn = self.pool.get().map_err(InfraError::from)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {TOKEN_COLUMNS} FROM feed_tokens
                 WHERE owner_id = ?1 ORDER BY created_at_ms ASC"
            ))
            .map_err(InfraError::from)?;

        let tokens = stmt
            .query_map([owner_id], row_to_token)
            .map_err(InfraError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)?;

        Ok(tokens)
    }

    #[instrument(skip_all)]
    async fn record_access(&self, token: &str, accessed_at_ms: i64) -> Result<()> {
        let conn = self.pool.get().map_err(InfraError::from)?;

        conn.execute(
            "UPDATE feed_tokens SET
                access_count = access_count + 1, last_accessed_at_ms = ?1
             WHERE token = ?2",
            [&accessed_at_ms as &dyn ToSql, &token].as_ref(),
        )
        .map_err(InfraError::from)?;

        Ok(())
    }

    #[instrument(skip_all)]
    async fn revoke(&self, token: &str, owner_id: &str) -> Result<bool> {
        let conn = self.pool.get().map_err(InfraError::from)?;

        let changed = conn
            .execute(
                "UPDATE feed_tokens SET is_active = 0 WHERE token = ?1 AND owner_id = ?2",
                [token, owner_id],
            )
            .map_err(InfraError::from)?;

        Ok(changed > 0)
    }
}
