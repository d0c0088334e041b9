//! Repository for the `dispatch_outbox` table.
//!
//! Claiming uses `FOR UPDATE SKIP LOCKED` plus a short lease (pushing
//! `not_before` forward) so the API process and any number of standalone
//! workers can poll the same table without double-sending. A worker that
//! crashes mid-send leaves its claimed rows to retry after the lease
//! expires — delivery is at-least-once.

use merx_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::outbox::{NewOutboxEntry, OutboxEntry};

const COLUMNS: &str = "id, channel, recipient, payload, trigger_key, template_id, status, \
     not_before, attempts_remaining, attempts_made, last_error, created_at, updated_at";

/// How long a claimed entry is invisible to other pollers.
const CLAIM_LEASE_SECS: i64 = 300;

/// Provides enqueue and claim operations for the dispatch outbox.
pub struct OutboxRepo;

impl OutboxRepo {
    /// Enqueue a rendered payload for delivery, returning the generated ID.
    pub async fn enqueue(pool: &PgPool, entry: &NewOutboxEntry<'_>) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO dispatch_outbox \
                (channel, recipient, payload, trigger_key, template_id, not_before, \
                 attempts_remaining) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(entry.channel)
        .bind(entry.recipient)
        .bind(entry.payload)
        .bind(entry.trigger_key)
        .bind(entry.template_id)
        .bind(entry.not_before)
        .bind(entry.attempts_remaining)
        .fetch_one(pool)
        .await
    }

    /// Claim up to `limit` due pending entries.
    ///
    /// Claimed rows have one attempt consumed and their `not_before` pushed
    /// past the claim lease; the returned `attempts_remaining` is the count
    /// left *after* the attempt now being made.
    pub async fn claim_due(
        pool: &PgPool,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<OutboxEntry>, sqlx::Error> {
        let query = format!(
            "UPDATE dispatch_outbox SET \
                attempts_remaining = attempts_remaining - 1, \
                attempts_made = attempts_made + 1, \
                not_before = $1 + make_interval(secs => $3::float8), \
                updated_at = NOW() \
             WHERE id IN ( \
                SELECT id FROM dispatch_outbox \
                WHERE status = 'pending' AND not_before <= $1 \
                ORDER BY not_before ASC, id ASC \
                LIMIT $2 \
                FOR UPDATE SKIP LOCKED) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OutboxEntry>(&query)
            .bind(now)
            .bind(limit)
            .bind(CLAIM_LEASE_SECS as f64)
            .fetch_all(pool)
            .await
    }

    /// Mark an entry delivered.
    pub async fn mark_sent(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE dispatch_outbox SET status = 'sent', last_error = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Reschedule a failed attempt that still has attempts left.
    pub async fn reschedule(
        pool: &PgPool,
        id: DbId,
        not_before: Timestamp,
        error: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE dispatch_outbox SET not_before = $2, last_error = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(not_before)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark an entry permanently failed.
    pub async fn mark_failed(pool: &PgPool, id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE dispatch_outbox SET status = 'failed', last_error = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Find an entry by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<OutboxEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM dispatch_outbox WHERE id = $1");
        sqlx::query_as::<_, OutboxEntry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List entries recorded for a trigger key, oldest first. Test support.
    pub async fn list_for_trigger(
        pool: &PgPool,
        trigger_key: &str,
    ) -> Result<Vec<OutboxEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM dispatch_outbox WHERE trigger_key = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, OutboxEntry>(&query)
            .bind(trigger_key)
            .fetch_all(pool)
            .await
    }
}
