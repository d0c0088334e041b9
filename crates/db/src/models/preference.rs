//! Contact delivery preference model.

use merx_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `contact_preferences` table.
///
/// A recipient with no row is opted in to every channel.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContactPreference {
    pub id: DbId,
    pub recipient: String,
    pub email_opt_out: bool,
    pub sms_opt_out: bool,
    pub updated_at: Timestamp,
}

/// DTO for upserting a recipient's preferences.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateContactPreference {
    pub email_opt_out: Option<bool>,
    pub sms_opt_out: Option<bool>,
}
