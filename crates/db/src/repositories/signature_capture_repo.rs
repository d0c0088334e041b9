//! Repository for the `signature_captures` table.

use merx_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::signature_capture::{CreateSignatureCapture, SignatureCapture, STATUS_EXPIRED};

const COLUMNS: &str = "id, prospect_id, role_key, signer_name, signer_email, status, notes, \
     reminder_3day_sent_at, reminder_1day_sent_at, requested_at, expires_at, \
     created_at, updated_at";

/// Signature requests expire seven days after they are requested.
pub const SIGNATURE_WINDOW_DAYS: i64 = 7;

/// Provides CRUD operations for signature capture requests.
pub struct SignatureCaptureRepo;

impl SignatureCaptureRepo {
    /// Insert a new signature request.
    ///
    /// `expires_at` defaults to [`SIGNATURE_WINDOW_DAYS`] after now.
    pub async fn create(
        pool: &PgPool,
        input: &CreateSignatureCapture,
    ) -> Result<SignatureCapture, sqlx::Error> {
        let query = format!(
            "INSERT INTO signature_captures \
                (prospect_id, role_key, signer_name, signer_email, expires_at) \
             VALUES ($1, COALESCE($2, 'owner'), $3, $4, \
                     COALESCE($5, NOW() + make_interval(days => $6::int))) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SignatureCapture>(&query)
            .bind(input.prospect_id)
            .bind(&input.role_key)
            .bind(&input.signer_name)
            .bind(&input.signer_email)
            .bind(input.expires_at)
            .bind(SIGNATURE_WINDOW_DAYS as i32)
            .fetch_one(pool)
            .await
    }

    /// Find a signature request by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<SignatureCapture>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM signature_captures WHERE id = $1");
        sqlx::query_as::<_, SignatureCapture>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all requests still awaiting a signer — the sweep's work list.
    pub async fn list_requested(pool: &PgPool) -> Result<Vec<SignatureCapture>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM signature_captures \
             WHERE status = 'requested' \
             ORDER BY expires_at ASC"
        );
        sqlx::query_as::<_, SignatureCapture>(&query)
            .fetch_all(pool)
            .await
    }

    /// Transition a request to `expired` and append an audit note.
    ///
    /// Returns `true` only if the row was still `requested`, so concurrent
    /// sweeps expire a request once.
    pub async fn mark_expired(pool: &PgPool, id: DbId, note: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE signature_captures SET \
                status = $2, \
                notes = COALESCE(notes || E'\\n', '') || $3, \
                updated_at = NOW() \
             WHERE id = $1 AND status = 'requested'",
        )
        .bind(id)
        .bind(STATUS_EXPIRED)
        .bind(note)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stamp the 3-day reminder flag. Returns `false` if already stamped.
    pub async fn mark_3day_reminder_sent(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        Self::mark_reminder_sent(pool, id, "reminder_3day_sent_at").await
    }

    /// Stamp the 1-day reminder flag. Returns `false` if already stamped.
    pub async fn mark_1day_reminder_sent(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        Self::mark_reminder_sent(pool, id, "reminder_1day_sent_at").await
    }

    async fn mark_reminder_sent(
        pool: &PgPool,
        id: DbId,
        column: &'static str,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE signature_captures SET {column} = NOW(), updated_at = NOW() \
             WHERE id = $1 AND {column} IS NULL"
        );
        let result = sqlx::query(&query).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Backdate request/expiry timestamps. Test support for sweep scenarios.
    pub async fn set_window(
        pool: &PgPool,
        id: DbId,
        requested_at: Timestamp,
        expires_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE signature_captures SET requested_at = $2, expires_at = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(requested_at)
        .bind(expires_at)
        .execute(pool)
        .await?;
        Ok(())
    }
}
