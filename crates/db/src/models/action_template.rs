//! Action template entity model and DTOs.

use merx_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `action_templates` table.
///
/// `config` is the channel-specific payload definition (subject/body for
/// email, URL/method for webhooks, ...); `variables` maps `{{token}}` names
/// to human-readable descriptions for the preview UI.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ActionTemplate {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub action_type: String,
    pub category: Option<String>,
    pub config: serde_json::Value,
    pub variables: serde_json::Value,
    pub is_active: bool,
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new action template.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateActionTemplate {
    pub name: String,
    pub description: Option<String>,
    pub action_type: String,
    pub category: Option<String>,
    pub config: serde_json::Value,
    #[serde(default)]
    pub variables: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

/// DTO for updating an existing action template. All fields are optional;
/// `action_type` is intentionally absent — a template never changes channel.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateActionTemplate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub config: Option<serde_json::Value>,
    pub variables: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

/// Query parameters for template listing.
#[derive(Debug, Deserialize)]
pub struct ActionTemplateListParams {
    pub action_type: Option<String>,
    pub category: Option<String>,
    pub active_only: Option<bool>,
}
