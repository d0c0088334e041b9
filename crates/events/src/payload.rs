//! Rendered outbound payloads.
//!
//! [`render_action`] turns an action template plus a [`TriggerContext`]
//! into a channel-typed [`OutboundPayload`] with every `{{variable}}`
//! substituted. Payloads are stored verbatim in the dispatch outbox, so no
//! substitution happens after enqueue.

use std::collections::BTreeMap;

use merx_core::channels::ActionType;
use merx_core::render::render_template;
use merx_db::models::action_template::ActionTemplate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::{TriggerContext, KEY_RECIPIENT_EMAIL, KEY_RECIPIENT_PHONE};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for payload rendering failures.
///
/// These surface as `failed` dispatch log entries for the affected action;
/// they never abort the rest of a trigger firing.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The template's stored action type is not a known channel.
    #[error("Unknown action type: {0}")]
    UnknownActionType(String),

    /// A required config field is missing or has the wrong shape.
    #[error("Template config field missing or invalid: {0}")]
    Config(&'static str),

    /// The context lacks the addressing key the channel needs.
    #[error("Context is missing required key: {0}")]
    MissingRecipient(&'static str),
}

// ---------------------------------------------------------------------------
// OutboundPayload
// ---------------------------------------------------------------------------

/// A fully rendered, channel-typed outbound communication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "lowercase")]
pub enum OutboundPayload {
    Email {
        subject: String,
        html: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    Sms {
        message: String,
    },
    Webhook {
        url: String,
        method: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        headers: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<String>,
    },
    Notification {
        title: String,
        message: String,
    },
    Slack {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        webhook_url: Option<String>,
        #[serde(rename = "slack_channel", default, skip_serializing_if = "Option::is_none")]
        channel: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        message: String,
    },
    Teams {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        webhook_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        message: String,
    },
}

impl OutboundPayload {
    /// The channel name this payload is delivered on.
    pub fn channel(&self) -> &'static str {
        match self {
            OutboundPayload::Email { .. } => merx_core::channels::CHANNEL_EMAIL,
            OutboundPayload::Sms { .. } => merx_core::channels::CHANNEL_SMS,
            OutboundPayload::Webhook { .. } => merx_core::channels::CHANNEL_WEBHOOK,
            OutboundPayload::Notification { .. } => merx_core::channels::CHANNEL_NOTIFICATION,
            OutboundPayload::Slack { .. } => merx_core::channels::CHANNEL_SLACK,
            OutboundPayload::Teams { .. } => merx_core::channels::CHANNEL_TEAMS,
        }
    }

    /// Short human-readable summary for the dispatch log: the subject for
    /// email, the title or first line of the message otherwise.
    pub fn summary(&self) -> String {
        let line = |s: &str| s.lines().next().unwrap_or("").to_string();
        match self {
            OutboundPayload::Email { subject, .. } => subject.clone(),
            OutboundPayload::Sms { message } => line(message),
            OutboundPayload::Webhook { method, url, .. } => format!("{method} {url}"),
            OutboundPayload::Notification { title, .. } => title.clone(),
            OutboundPayload::Slack { title, message, .. }
            | OutboundPayload::Teams { title, message, .. } => {
                title.clone().unwrap_or_else(|| line(message))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render an action template against a trigger context.
///
/// Returns the delivery recipient (address, phone number, or endpoint
/// description) alongside the rendered payload.
pub fn render_action(
    template: &ActionTemplate,
    context: &TriggerContext,
) -> Result<(String, OutboundPayload), RenderError> {
    let action_type: ActionType = template
        .action_type
        .parse()
        .map_err(|_| RenderError::UnknownActionType(template.action_type.clone()))?;

    let config = &template.config;
    let values = context.values();
    let render = |text: &str| render_template(text, values);

    match action_type {
        ActionType::Email => {
            let to = context
                .get(KEY_RECIPIENT_EMAIL)
                .ok_or(RenderError::MissingRecipient(KEY_RECIPIENT_EMAIL))?
                .to_string();
            let payload = OutboundPayload::Email {
                subject: render(config_str(config, "subject")?),
                html: render(config_str(config, "html_content")?),
                text: config_opt_str(config, "text_content")?.map(render),
            };
            Ok((to, payload))
        }
        ActionType::Sms => {
            let to = context
                .get(KEY_RECIPIENT_PHONE)
                .ok_or(RenderError::MissingRecipient(KEY_RECIPIENT_PHONE))?
                .to_string();
            let payload = OutboundPayload::Sms {
                message: render(config_str(config, "message")?),
            };
            Ok((to, payload))
        }
        ActionType::Webhook => {
            let url = render(config_str(config, "url")?);
            let mut headers = BTreeMap::new();
            if let Some(Value::Object(map)) = config.get("headers") {
                for (key, value) in map {
                    let text = value.as_str().ok_or(RenderError::Config("headers"))?;
                    headers.insert(key.clone(), render(text));
                }
            }
            let payload = OutboundPayload::Webhook {
                url: url.clone(),
                method: config_str(config, "method")?.to_uppercase(),
                headers,
                body: config_opt_str(config, "body")?.map(render),
            };
            Ok((url, payload))
        }
        ActionType::Notification => {
            let to = context
                .get(KEY_RECIPIENT_EMAIL)
                .ok_or(RenderError::MissingRecipient(KEY_RECIPIENT_EMAIL))?
                .to_string();
            let payload = OutboundPayload::Notification {
                title: render(config_str(config, "title")?),
                message: render(config_str(config, "message")?),
            };
            Ok((to, payload))
        }
        ActionType::Slack => {
            let webhook_url = config_opt_str(config, "webhook_url")?.map(render);
            let channel = config_opt_str(config, "channel")?.map(render);
            let recipient = webhook_url
                .clone()
                .or_else(|| channel.clone())
                .unwrap_or_else(|| "slack".to_string());
            let payload = OutboundPayload::Slack {
                webhook_url,
                channel,
                title: config_opt_str(config, "title")?.map(render),
                message: render(config_str(config, "message")?),
            };
            Ok((recipient, payload))
        }
        ActionType::Teams => {
            let webhook_url = config_opt_str(config, "webhook_url")?.map(render);
            let recipient = webhook_url.clone().unwrap_or_else(|| "teams".to_string());
            let payload = OutboundPayload::Teams {
                webhook_url,
                title: config_opt_str(config, "title")?.map(render),
                message: render(config_str(config, "message")?),
            };
            Ok((recipient, payload))
        }
    }
}

/// Fetch a required string field from a template config.
fn config_str<'a>(config: &'a Value, field: &'static str) -> Result<&'a str, RenderError> {
    config
        .get(field)
        .and_then(Value::as_str)
        .ok_or(RenderError::Config(field))
}

/// Fetch an optional string field; present-but-not-a-string is an error.
fn config_opt_str<'a>(
    config: &'a Value,
    field: &'static str,
) -> Result<Option<&'a str>, RenderError> {
    match config.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(RenderError::Config(field)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn template(action_type: &str, config: Value) -> ActionTemplate {
        ActionTemplate {
            id: 1,
            name: "t".into(),
            description: None,
            action_type: action_type.into(),
            category: None,
            config,
            variables: json!({}),
            is_active: true,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn renders_email_with_substituted_subject() {
        let tpl = template(
            "email",
            json!({"subject": "Hi {{owner_name}}", "html_content": "<p>{{company_name}}</p>"}),
        );
        let ctx = TriggerContext::new()
            .with("recipient_email", "owner@example.com")
            .with("owner_name", "Ada")
            .with("company_name", "Acme Foods");

        let (to, payload) = render_action(&tpl, &ctx).unwrap();
        assert_eq!(to, "owner@example.com");
        assert_eq!(
            payload,
            OutboundPayload::Email {
                subject: "Hi Ada".into(),
                html: "<p>Acme Foods</p>".into(),
                text: None,
            }
        );
    }

    #[test]
    fn email_without_recipient_key_fails() {
        let tpl = template("email", json!({"subject": "s", "html_content": "h"}));
        let err = render_action(&tpl, &TriggerContext::new()).unwrap_err();
        assert!(matches!(err, RenderError::MissingRecipient("recipient_email")));
    }

    #[test]
    fn webhook_renders_url_and_body_tokens() {
        let tpl = template(
            "webhook",
            json!({
                "url": "https://hooks.example.com/{{tenant}}",
                "method": "post",
                "headers": {"X-Source": "merx-{{tenant}}"},
                "body": "{\"company\":\"{{company_name}}\"}",
            }),
        );
        let ctx = TriggerContext::new()
            .with("tenant", "acme")
            .with("company_name", "Acme Foods");

        let (recipient, payload) = render_action(&tpl, &ctx).unwrap();
        assert_eq!(recipient, "https://hooks.example.com/acme");
        let OutboundPayload::Webhook { method, headers, body, .. } = payload else {
            panic!("expected webhook payload");
        };
        assert_eq!(method, "POST");
        assert_eq!(headers["X-Source"], "merx-acme");
        assert_eq!(body.as_deref(), Some("{\"company\":\"Acme Foods\"}"));
    }

    #[test]
    fn slack_recipient_falls_back_to_channel_then_literal() {
        let tpl = template("slack", json!({"message": "m", "channel": "#ops"}));
        let (recipient, _) = render_action(&tpl, &TriggerContext::new()).unwrap();
        assert_eq!(recipient, "#ops");

        let tpl = template("slack", json!({"message": "m"}));
        let (recipient, _) = render_action(&tpl, &TriggerContext::new()).unwrap();
        assert_eq!(recipient, "slack");
    }

    #[test]
    fn unknown_action_type_is_rejected() {
        let tpl = template("pager", json!({}));
        assert!(matches!(
            render_action(&tpl, &TriggerContext::new()),
            Err(RenderError::UnknownActionType(_))
        ));
    }

    #[test]
    fn missing_config_field_names_the_field() {
        let tpl = template("sms", json!({}));
        let ctx = TriggerContext::new().with("recipient_phone", "+15550100");
        let err = render_action(&tpl, &ctx).unwrap_err();
        assert!(matches!(err, RenderError::Config("message")));
    }

    #[test]
    fn payload_round_trips_through_json() {
        let payload = OutboundPayload::Email {
            subject: "s".into(),
            html: "<p>h</p>".into(),
            text: Some("h".into()),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["channel"], "email");
        let back: OutboundPayload = serde_json::from_value(value).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn summary_prefers_subject_and_title() {
        let email = OutboundPayload::Email {
            subject: "Expiring soon".into(),
            html: String::new(),
            text: None,
        };
        assert_eq!(email.summary(), "Expiring soon");

        let slack = OutboundPayload::Slack {
            webhook_url: None,
            channel: None,
            title: None,
            message: "first line\nsecond".into(),
        };
        assert_eq!(slack.summary(), "first line");
    }
}
