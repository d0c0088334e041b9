//! Dispatch outbox model.
//!
//! The dispatcher decides *what* to send and enqueues it here; the outbox
//! worker owns *reliably sending it* (delay, retry, backoff). This is the
//! durable form of the advisory `delay_seconds`/`retry_on_failure` fields
//! on trigger actions.

use merx_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Entry is waiting for its `not_before` time.
pub const STATUS_PENDING: &str = "pending";

/// Entry was delivered successfully.
pub const STATUS_SENT: &str = "sent";

/// Entry exhausted its attempts without a successful delivery.
pub const STATUS_FAILED: &str = "failed";

/// A row from the `dispatch_outbox` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OutboxEntry {
    pub id: DbId,
    pub channel: String,
    pub recipient: String,
    /// Fully rendered channel payload; no further substitution happens
    /// after enqueue.
    pub payload: serde_json::Value,
    pub trigger_key: Option<String>,
    pub template_id: Option<DbId>,
    pub status: String,
    pub not_before: Timestamp,
    pub attempts_remaining: i32,
    pub attempts_made: i32,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields recorded for a new outbox entry.
#[derive(Debug, Clone)]
pub struct NewOutboxEntry<'a> {
    pub channel: &'a str,
    pub recipient: &'a str,
    pub payload: &'a serde_json::Value,
    pub trigger_key: Option<&'a str>,
    pub template_id: Option<DbId>,
    pub not_before: Timestamp,
    pub attempts_remaining: i32,
}
