//! Repository for the `trigger_actions` table.
//!
//! `sequence_order` is a plain sort key, never an identity: reads always
//! re-derive execution order with `ORDER BY sequence_order ASC, id ASC`
//! (id breaks ties by insertion), and nothing enforces uniqueness.

use merx_core::types::DbId;
use sqlx::PgPool;

use crate::models::trigger::{CreateTriggerAction, TriggerAction, UpdateTriggerAction};

const COLUMNS: &str = "id, trigger_id, template_id, sequence_order, delay_seconds, \
     requires_email_preference, requires_sms_preference, retry_on_failure, max_retries, \
     is_active, created_at";

/// Provides CRUD operations for trigger action links.
pub struct TriggerActionRepo;

impl TriggerActionRepo {
    /// Link a template beneath a trigger.
    ///
    /// When `sequence_order` is absent it is assigned
    /// `max(existing) + 1` (1 when the trigger has no links yet) — a
    /// creation-time convenience default, not a uniqueness constraint.
    pub async fn create(
        pool: &PgPool,
        trigger_id: DbId,
        input: &CreateTriggerAction,
    ) -> Result<TriggerAction, sqlx::Error> {
        let query = format!(
            "INSERT INTO trigger_actions \
                (trigger_id, template_id, sequence_order, delay_seconds, \
                 requires_email_preference, requires_sms_preference, \
                 retry_on_failure, max_retries, is_active) \
             VALUES ($1, $2, \
                COALESCE($3, (SELECT COALESCE(MAX(sequence_order), 0) + 1 \
                              FROM trigger_actions WHERE trigger_id = $1)), \
                COALESCE($4, 0), COALESCE($5, false), COALESCE($6, false), \
                COALESCE($7, false), COALESCE($8, 0), COALESCE($9, true)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TriggerAction>(&query)
            .bind(trigger_id)
            .bind(input.template_id)
            .bind(input.sequence_order)
            .bind(input.delay_seconds)
            .bind(input.requires_email_preference)
            .bind(input.requires_sms_preference)
            .bind(input.retry_on_failure)
            .bind(input.max_retries)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Find a trigger action by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TriggerAction>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM trigger_actions WHERE id = $1");
        sqlx::query_as::<_, TriggerAction>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all links beneath a trigger in execution order.
    pub async fn list_for_trigger(
        pool: &PgPool,
        trigger_id: DbId,
    ) -> Result<Vec<TriggerAction>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM trigger_actions \
             WHERE trigger_id = $1 \
             ORDER BY sequence_order ASC, id ASC"
        );
        sqlx::query_as::<_, TriggerAction>(&query)
            .bind(trigger_id)
            .fetch_all(pool)
            .await
    }

    /// List only the active links beneath a trigger in execution order —
    /// the set the dispatcher executes.
    pub async fn list_active_for_trigger(
        pool: &PgPool,
        trigger_id: DbId,
    ) -> Result<Vec<TriggerAction>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM trigger_actions \
             WHERE trigger_id = $1 AND is_active = true \
             ORDER BY sequence_order ASC, id ASC"
        );
        sqlx::query_as::<_, TriggerAction>(&query)
            .bind(trigger_id)
            .fetch_all(pool)
            .await
    }

    /// Update a trigger action link.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTriggerAction,
    ) -> Result<Option<TriggerAction>, sqlx::Error> {
        let query = format!(
            "UPDATE trigger_actions SET \
                sequence_order = COALESCE($2, sequence_order), \
                delay_seconds = COALESCE($3, delay_seconds), \
                requires_email_preference = COALESCE($4, requires_email_preference), \
                requires_sms_preference = COALESCE($5, requires_sms_preference), \
                retry_on_failure = COALESCE($6, retry_on_failure), \
                max_retries = COALESCE($7, max_retries), \
                is_active = COALESCE($8, is_active) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TriggerAction>(&query)
            .bind(id)
            .bind(input.sequence_order)
            .bind(input.delay_seconds)
            .bind(input.requires_email_preference)
            .bind(input.requires_sms_preference)
            .bind(input.retry_on_failure)
            .bind(input.max_retries)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Remove a link. The template itself is never touched.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM trigger_actions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
