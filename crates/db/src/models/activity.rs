//! Dispatch log model.
//!
//! One row per attempted or skipped outbound communication, feeding the
//! activity/analytics view. The backing table is `email_activity` — the
//! name predates the non-email channels.

use merx_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `email_activity` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ActivityEntry {
    pub id: DbId,
    pub channel: String,
    pub recipient: String,
    /// Subject line for email, first line of the message otherwise.
    pub summary: Option<String>,
    pub status: String,
    /// Error text for failures, skip reason for skips.
    pub detail: Option<String>,
    pub trigger_key: Option<String>,
    pub template_id: Option<DbId>,
    pub created_at: Timestamp,
}

/// Fields recorded for a new dispatch log entry.
#[derive(Debug, Clone)]
pub struct NewActivityEntry<'a> {
    pub channel: &'a str,
    pub recipient: &'a str,
    pub summary: Option<&'a str>,
    pub status: &'a str,
    pub detail: Option<&'a str>,
    pub trigger_key: Option<&'a str>,
    pub template_id: Option<DbId>,
}

/// Query parameters for activity listing.
#[derive(Debug, Deserialize)]
pub struct ActivityListParams {
    pub channel: Option<String>,
    pub status: Option<String>,
    pub recipient: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
