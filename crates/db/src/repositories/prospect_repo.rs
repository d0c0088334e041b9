//! Repository for the `prospects` table.

use merx_core::types::DbId;
use sqlx::PgPool;

use crate::models::prospect::Prospect;

const COLUMNS: &str =
    "id, business_name, contact_name, contact_email, created_by_name, created_at";

/// Provides lookup operations for prospect records.
pub struct ProspectRepo;

impl ProspectRepo {
    /// Insert a prospect record, returning the created row.
    pub async fn create(
        pool: &PgPool,
        business_name: Option<&str>,
        contact_name: Option<&str>,
        contact_email: Option<&str>,
        created_by_name: Option<&str>,
    ) -> Result<Prospect, sqlx::Error> {
        let query = format!(
            "INSERT INTO prospects (business_name, contact_name, contact_email, created_by_name) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Prospect>(&query)
            .bind(business_name)
            .bind(contact_name)
            .bind(contact_email)
            .bind(created_by_name)
            .fetch_one(pool)
            .await
    }

    /// Find a prospect by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Prospect>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM prospects WHERE id = $1");
        sqlx::query_as::<_, Prospect>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
