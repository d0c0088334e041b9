//! Repository for the `notifications` table.

use merx_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{Notification, NotificationListParams};

const COLUMNS: &str = "id, recipient, title, message, is_read, read_at, created_at";

/// Maximum page size for notification listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for notification listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides CRUD operations for in-app notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Store a notification for a recipient, returning the generated ID.
    pub async fn create(
        pool: &PgPool,
        recipient: &str,
        title: &str,
        message: &str,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notifications (recipient, title, message) \
             VALUES ($1, $2, $3) \
             RETURNING id",
        )
        .bind(recipient)
        .bind(title)
        .bind(message)
        .fetch_one(pool)
        .await
    }

    /// List notifications for a recipient, newest first.
    pub async fn list(
        pool: &PgPool,
        params: &NotificationListParams,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = params.offset.unwrap_or(0);
        let filter = if params.unread_only.unwrap_or(false) {
            "AND is_read = false"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE recipient = $1 {filter} \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(&params.recipient)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Mark a single notification as read.
    ///
    /// Returns `true` if the notification was found unread and updated.
    pub async fn mark_read(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true, read_at = NOW() \
             WHERE id = $1 AND is_read = false",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
