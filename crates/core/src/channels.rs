//! Well-known channel and status name constants.
//!
//! These must match the values stored in the `action_templates.action_type`,
//! `dispatch_outbox.channel`, and `email_activity.status` columns and
//! referenced by the dispatcher, outbox worker, and API handlers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Email delivered via SMTP.
pub const CHANNEL_EMAIL: &str = "email";

/// Text message delivered via the configured SMS gateway.
pub const CHANNEL_SMS: &str = "sms";

/// Generic HTTP POST to an external endpoint.
pub const CHANNEL_WEBHOOK: &str = "webhook";

/// In-app notification stored for the bell UI.
pub const CHANNEL_NOTIFICATION: &str = "notification";

/// Slack incoming-webhook message.
pub const CHANNEL_SLACK: &str = "slack";

/// Microsoft Teams incoming-webhook message.
pub const CHANNEL_TEAMS: &str = "teams";

/// Dispatch log entry: the send was attempted and succeeded.
pub const STATUS_SENT: &str = "sent";

/// Dispatch log entry: the send was attempted and failed.
pub const STATUS_FAILED: &str = "failed";

/// Dispatch log entry: the action was skipped (opt-out, inactive template).
pub const STATUS_SKIPPED: &str = "skipped";

// ---------------------------------------------------------------------------
// ActionType
// ---------------------------------------------------------------------------

/// The closed set of template channel types.
///
/// Stored in `action_templates.action_type` as its lowercase string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Email,
    Sms,
    Webhook,
    Notification,
    Slack,
    Teams,
}

impl ActionType {
    /// The column/string form of the action type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Email => CHANNEL_EMAIL,
            ActionType::Sms => CHANNEL_SMS,
            ActionType::Webhook => CHANNEL_WEBHOOK,
            ActionType::Notification => CHANNEL_NOTIFICATION,
            ActionType::Slack => CHANNEL_SLACK,
            ActionType::Teams => CHANNEL_TEAMS,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            CHANNEL_EMAIL => Ok(ActionType::Email),
            CHANNEL_SMS => Ok(ActionType::Sms),
            CHANNEL_WEBHOOK => Ok(ActionType::Webhook),
            CHANNEL_NOTIFICATION => Ok(ActionType::Notification),
            CHANNEL_SLACK => Ok(ActionType::Slack),
            CHANNEL_TEAMS => Ok(ActionType::Teams),
            other => Err(crate::error::CoreError::Validation(format!(
                "Unknown action type: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
