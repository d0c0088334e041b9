//! Repository for the `trigger_catalog` table.

use merx_core::types::DbId;
use sqlx::PgPool;

use crate::models::trigger::{CreateTrigger, TriggerCatalogEntry, UpdateTrigger};

const COLUMNS: &str =
    "id, trigger_key, name, description, category, is_active, created_at, updated_at";

/// Provides CRUD operations for trigger catalog entries.
pub struct TriggerCatalogRepo;

impl TriggerCatalogRepo {
    /// Insert a new catalog entry, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateTrigger,
    ) -> Result<TriggerCatalogEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO trigger_catalog (trigger_key, name, description, category, is_active) \
             VALUES ($1, $2, $3, $4, COALESCE($5, true)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TriggerCatalogEntry>(&query)
            .bind(&input.trigger_key)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Find a catalog entry by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TriggerCatalogEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM trigger_catalog WHERE id = $1");
        sqlx::query_as::<_, TriggerCatalogEntry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an *active* catalog entry by its stable key.
    ///
    /// Returns `None` for unknown and inactive keys alike — firing such a
    /// key is a silent no-op, not an error.
    pub async fn find_active_by_key(
        pool: &PgPool,
        trigger_key: &str,
    ) -> Result<Option<TriggerCatalogEntry>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM trigger_catalog WHERE trigger_key = $1 AND is_active = true");
        sqlx::query_as::<_, TriggerCatalogEntry>(&query)
            .bind(trigger_key)
            .fetch_optional(pool)
            .await
    }

    /// List all catalog entries, grouped by category then name.
    pub async fn list(pool: &PgPool) -> Result<Vec<TriggerCatalogEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM trigger_catalog ORDER BY category ASC NULLS LAST, name ASC"
        );
        sqlx::query_as::<_, TriggerCatalogEntry>(&query)
            .fetch_all(pool)
            .await
    }

    /// Update a catalog entry. `trigger_key` is write-once and not touched.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTrigger,
    ) -> Result<Option<TriggerCatalogEntry>, sqlx::Error> {
        let query = format!(
            "UPDATE trigger_catalog SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                category = COALESCE($4, category), \
                is_active = COALESCE($5, is_active), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TriggerCatalogEntry>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Delete a catalog entry; its trigger actions cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM trigger_catalog WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
