//! Repository for the `action_templates` table.

use merx_core::types::DbId;
use sqlx::PgPool;

use crate::models::action_template::{
    ActionTemplate, ActionTemplateListParams, CreateActionTemplate, UpdateActionTemplate,
};

const COLUMNS: &str = "id, name, description, action_type, category, config, variables, \
     is_active, version, created_at, updated_at";

/// Provides CRUD operations for action templates.
pub struct ActionTemplateRepo;

impl ActionTemplateRepo {
    /// Insert a new template, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateActionTemplate,
    ) -> Result<ActionTemplate, sqlx::Error> {
        let query = format!(
            "INSERT INTO action_templates \
                (name, description, action_type, category, config, variables, is_active) \
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, '{{}}'::jsonb), COALESCE($7, true)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ActionTemplate>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.action_type)
            .bind(&input.category)
            .bind(&input.config)
            .bind(&input.variables)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Find a template by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ActionTemplate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM action_templates WHERE id = $1");
        sqlx::query_as::<_, ActionTemplate>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List templates with optional type/category/active filters.
    pub async fn list(
        pool: &PgPool,
        params: &ActionTemplateListParams,
    ) -> Result<Vec<ActionTemplate>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM action_templates \
             WHERE ($1::text IS NULL OR action_type = $1) \
               AND ($2::text IS NULL OR category = $2) \
               AND ($3::bool IS NOT true OR is_active = true) \
             ORDER BY name ASC"
        );
        sqlx::query_as::<_, ActionTemplate>(&query)
            .bind(&params.action_type)
            .bind(&params.category)
            .bind(params.active_only)
            .fetch_all(pool)
            .await
    }

    /// Update a template. Only non-`None` fields are applied. Increments
    /// version and refreshes `updated_at`.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateActionTemplate,
    ) -> Result<Option<ActionTemplate>, sqlx::Error> {
        let query = format!(
            "UPDATE action_templates SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                category = COALESCE($4, category), \
                config = COALESCE($5, config), \
                variables = COALESCE($6, variables), \
                is_active = COALESCE($7, is_active), \
                version = version + 1, \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ActionTemplate>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.config)
            .bind(&input.variables)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Duplicate a template: same definition, name suffixed " (Copy)",
    /// always inactive so it never fires until reviewed.
    pub async fn duplicate(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ActionTemplate>, sqlx::Error> {
        let query = format!(
            "INSERT INTO action_templates \
                (name, description, action_type, category, config, variables, is_active) \
             SELECT name || ' (Copy)', description, action_type, category, config, variables, false \
             FROM action_templates WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ActionTemplate>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Hard-delete a template by ID. Returns `true` if a row was removed.
    ///
    /// Callers must check [`Self::active_trigger_names_referencing`] first;
    /// the referential guard lives at the handler layer so the conflict can
    /// be reported with the blocking trigger names.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM action_templates WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Names of triggers that still reference this template through an
    /// active trigger action. A non-empty result blocks deletion.
    pub async fn active_trigger_names_referencing(
        pool: &PgPool,
        template_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT DISTINCT tc.name \
             FROM trigger_actions ta \
             JOIN trigger_catalog tc ON tc.id = ta.trigger_id \
             WHERE ta.template_id = $1 AND ta.is_active = true \
             ORDER BY tc.name ASC",
        )
        .bind(template_id)
        .fetch_all(pool)
        .await
    }
}
