//! Slack and Microsoft Teams delivery via incoming webhooks.
//!
//! Both products accept a JSON POST to a per-workspace webhook URL. A
//! template config may carry its own `webhook_url`; otherwise the
//! deployment-wide default from the environment is used.

use super::webhook::{WebhookDelivery, WebhookError};

/// Delivers rendered messages to Slack and Teams incoming webhooks.
pub struct ChatDelivery {
    http: WebhookDelivery,
    default_slack_url: Option<String>,
    default_teams_url: Option<String>,
}

impl ChatDelivery {
    /// Create a delivery service with optional default webhook URLs.
    pub fn new(default_slack_url: Option<String>, default_teams_url: Option<String>) -> Self {
        Self {
            http: WebhookDelivery::new(None),
            default_slack_url,
            default_teams_url,
        }
    }

    /// Build from environment.
    ///
    /// | Variable            | Required | Default |
    /// |---------------------|----------|---------|
    /// | `SLACK_WEBHOOK_URL` | no       | —       |
    /// | `TEAMS_WEBHOOK_URL` | no       | —       |
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("SLACK_WEBHOOK_URL").ok(),
            std::env::var("TEAMS_WEBHOOK_URL").ok(),
        )
    }

    /// Post a Slack message. `webhook_url` overrides the default; returns
    /// `None`-configured as an error the caller maps to its channel name.
    pub async fn deliver_slack(
        &self,
        webhook_url: Option<&str>,
        channel: Option<&str>,
        title: Option<&str>,
        message: &str,
    ) -> Result<(), ChatError> {
        let url = webhook_url
            .or(self.default_slack_url.as_deref())
            .ok_or(ChatError::NoWebhookUrl("slack"))?;

        let text = match title {
            Some(title) => format!("*{title}*\n{message}"),
            None => message.to_string(),
        };
        let mut payload = serde_json::json!({ "text": text });
        if let Some(channel) = channel {
            payload["channel"] = serde_json::Value::String(channel.to_string());
        }

        self.http.post_json(url, &payload).await?;
        tracing::info!(channel = channel.unwrap_or("-"), "Slack message delivered");
        Ok(())
    }

    /// Post a Teams MessageCard.
    pub async fn deliver_teams(
        &self,
        webhook_url: Option<&str>,
        title: Option<&str>,
        message: &str,
    ) -> Result<(), ChatError> {
        let url = webhook_url
            .or(self.default_teams_url.as_deref())
            .ok_or(ChatError::NoWebhookUrl("teams"))?;

        let payload = serde_json::json!({
            "@type": "MessageCard",
            "@context": "http://schema.org/extensions",
            "summary": title.unwrap_or("Notification"),
            "title": title,
            "text": message,
        });

        self.http.post_json(url, &payload).await?;
        tracing::info!("Teams message delivered");
        Ok(())
    }
}

/// Error type for chat webhook delivery.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Neither the template config nor the environment provides a URL.
    #[error("No webhook URL configured for {0}")]
    NoWebhookUrl(&'static str),

    #[error(transparent)]
    Http(#[from] WebhookError),
}
