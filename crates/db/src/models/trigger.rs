//! Trigger catalog and trigger action models and DTOs.

use merx_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `trigger_catalog` table: a named, stable event identifier
/// that application code fires by key.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TriggerCatalogEntry {
    pub id: DbId,
    pub trigger_key: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `trigger_actions` table: an ordered link between a
/// trigger and an action template with delivery metadata.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TriggerAction {
    pub id: DbId,
    pub trigger_id: DbId,
    pub template_id: DbId,
    pub sequence_order: i32,
    pub delay_seconds: i32,
    pub requires_email_preference: bool,
    pub requires_sms_preference: bool,
    pub retry_on_failure: bool,
    pub max_retries: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
}

/// DTO for creating a trigger catalog entry. `trigger_key` is write-once.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTrigger {
    pub trigger_key: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

/// DTO for updating a trigger catalog entry. `trigger_key` is immutable
/// after creation and therefore absent here.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTrigger {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

/// DTO for linking a template beneath a trigger. A missing
/// `sequence_order` is assigned `max + 1` at insert time.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTriggerAction {
    pub template_id: DbId,
    pub sequence_order: Option<i32>,
    pub delay_seconds: Option<i32>,
    pub requires_email_preference: Option<bool>,
    pub requires_sms_preference: Option<bool>,
    pub retry_on_failure: Option<bool>,
    pub max_retries: Option<i32>,
    pub is_active: Option<bool>,
}

/// DTO for updating a trigger action link.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTriggerAction {
    pub sequence_order: Option<i32>,
    pub delay_seconds: Option<i32>,
    pub requires_email_preference: Option<bool>,
    pub requires_sms_preference: Option<bool>,
    pub retry_on_failure: Option<bool>,
    pub max_retries: Option<i32>,
    pub is_active: Option<bool>,
}
