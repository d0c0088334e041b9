//! Repository for the `email_activity` dispatch log.

use merx_core::types::DbId;
use sqlx::PgPool;

use crate::models::activity::{ActivityEntry, ActivityListParams, NewActivityEntry};

const COLUMNS: &str =
    "id, channel, recipient, summary, status, detail, trigger_key, template_id, created_at";

/// Maximum page size for activity listing.
const MAX_LIMIT: i64 = 200;

/// Default page size for activity listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides append and query operations for the dispatch log.
pub struct ActivityRepo;

impl ActivityRepo {
    /// Append one dispatch log entry, returning the generated ID.
    pub async fn record(pool: &PgPool, entry: &NewActivityEntry<'_>) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO email_activity \
                (channel, recipient, summary, status, detail, trigger_key, template_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(entry.channel)
        .bind(entry.recipient)
        .bind(entry.summary)
        .bind(entry.status)
        .bind(entry.detail)
        .bind(entry.trigger_key)
        .bind(entry.template_id)
        .fetch_one(pool)
        .await
    }

    /// List dispatch log entries, newest first, with optional filters.
    pub async fn list(
        pool: &PgPool,
        params: &ActivityListParams,
    ) -> Result<Vec<ActivityEntry>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = params.offset.unwrap_or(0);
        let query = format!(
            "SELECT {COLUMNS} FROM email_activity \
             WHERE ($1::text IS NULL OR channel = $1) \
               AND ($2::text IS NULL OR status = $2) \
               AND ($3::text IS NULL OR recipient = $3) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, ActivityEntry>(&query)
            .bind(&params.channel)
            .bind(&params.status)
            .bind(&params.recipient)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count entries recorded for a trigger key. Used by dispatch tests.
    pub async fn count_for_trigger(pool: &PgPool, trigger_key: &str) -> Result<i64, sqlx::Error> {
        let count: Option<i64> =
            sqlx::query_scalar("SELECT COUNT(*) FROM email_activity WHERE trigger_key = $1")
                .bind(trigger_key)
                .fetch_one(pool)
                .await?;
        Ok(count.unwrap_or(0))
    }
}
