//! Prospect model: the minimal merchant-prospect record the sweep resolves
//! company and agent context from.

use merx_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `prospects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Prospect {
    pub id: DbId,
    pub business_name: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub created_by_name: Option<String>,
    pub created_at: Timestamp,
}
