//! Repository for the `contact_preferences` table.

use sqlx::PgPool;

use crate::models::preference::{ContactPreference, UpdateContactPreference};

const COLUMNS: &str = "id, recipient, email_opt_out, sms_opt_out, updated_at";

/// Provides lookup and upsert operations for contact preferences.
pub struct ContactPreferenceRepo;

impl ContactPreferenceRepo {
    /// Find a recipient's preference row. `None` means opted in everywhere.
    pub async fn find_by_recipient(
        pool: &PgPool,
        recipient: &str,
    ) -> Result<Option<ContactPreference>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM contact_preferences WHERE recipient = $1");
        sqlx::query_as::<_, ContactPreference>(&query)
            .bind(recipient)
            .fetch_optional(pool)
            .await
    }

    /// Create or update a recipient's preference row.
    pub async fn upsert(
        pool: &PgPool,
        recipient: &str,
        input: &UpdateContactPreference,
    ) -> Result<ContactPreference, sqlx::Error> {
        let query = format!(
            "INSERT INTO contact_preferences (recipient, email_opt_out, sms_opt_out) \
             VALUES ($1, COALESCE($2, false), COALESCE($3, false)) \
             ON CONFLICT ON CONSTRAINT uq_contact_preferences_recipient DO UPDATE SET \
                email_opt_out = COALESCE($2, contact_preferences.email_opt_out), \
                sms_opt_out = COALESCE($3, contact_preferences.sms_opt_out), \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContactPreference>(&query)
            .bind(recipient)
            .bind(input.email_opt_out)
            .bind(input.sms_opt_out)
            .fetch_one(pool)
            .await
    }
}
