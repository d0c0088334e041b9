//! Channel-specific validation of action template `config` payloads.
//!
//! Every template carries a JSON `config` object whose required shape
//! depends on the action type. Validation runs before any write and fails
//! on the first offending field, so a rejected template is never partially
//! persisted.

use serde_json::Value;
use validator::ValidateUrl;

use crate::channels::ActionType;
use crate::error::CoreError;

/// HTTP methods accepted for webhook templates.
pub const WEBHOOK_METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

// ---------------------------------------------------------------------------
// Config validation
// ---------------------------------------------------------------------------

/// Validate a template `config` object against its action type.
///
/// Returns the first invalid field as a [`CoreError::Validation`] naming
/// that field, e.g. `config.subject is required`.
pub fn validate_config(action_type: ActionType, config: &Value) -> Result<(), CoreError> {
    if !config.is_object() {
        return Err(CoreError::Validation(
            "config must be a JSON object".to_string(),
        ));
    }

    match action_type {
        ActionType::Email => {
            require_string(config, "subject")?;
            require_string(config, "html_content")?;
            optional_string(config, "text_content")?;
        }
        ActionType::Sms => {
            require_string(config, "message")?;
        }
        ActionType::Webhook => {
            let url = require_string(config, "url")?;
            if !url.validate_url() {
                return Err(CoreError::Validation(
                    "config.url must be a valid URL".to_string(),
                ));
            }
            let method = require_string(config, "method")?;
            if !WEBHOOK_METHODS.contains(&method) {
                return Err(CoreError::Validation(format!(
                    "config.method must be one of {}",
                    WEBHOOK_METHODS.join(", ")
                )));
            }
            optional_string_map(config, "headers")?;
            optional_string(config, "body")?;
        }
        ActionType::Notification => {
            require_string(config, "title")?;
            require_string(config, "message")?;
        }
        ActionType::Slack | ActionType::Teams => {
            require_string(config, "message")?;
            if let Some(url) = optional_string(config, "webhook_url")? {
                if !url.validate_url() {
                    return Err(CoreError::Validation(
                        "config.webhook_url must be a valid URL".to_string(),
                    ));
                }
            }
            optional_string(config, "channel")?;
            optional_string(config, "title")?;
        }
    }

    Ok(())
}

/// Validate a template `variables` object: a mapping of variable name to
/// human-readable description, both strings.
pub fn validate_variables(variables: &Value) -> Result<(), CoreError> {
    let Some(map) = variables.as_object() else {
        return Err(CoreError::Validation(
            "variables must be a JSON object".to_string(),
        ));
    };

    for (name, description) in map {
        if !description.is_string() {
            return Err(CoreError::Validation(format!(
                "variables.{name} must be a string description"
            )));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Fetch a required non-empty string field from the config object.
fn require_string<'a>(config: &'a Value, field: &str) -> Result<&'a str, CoreError> {
    match config.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s),
        Some(Value::String(_)) => Err(CoreError::Validation(format!(
            "config.{field} must not be empty"
        ))),
        Some(_) => Err(CoreError::Validation(format!(
            "config.{field} must be a string"
        ))),
        None => Err(CoreError::Validation(format!(
            "config.{field} is required"
        ))),
    }
}

/// Fetch an optional string field; present-but-not-a-string is an error.
fn optional_string<'a>(config: &'a Value, field: &str) -> Result<Option<&'a str>, CoreError> {
    match config.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(CoreError::Validation(format!(
            "config.{field} must be a string"
        ))),
    }
}

/// Fetch an optional object-of-strings field (webhook headers).
fn optional_string_map(config: &Value, field: &str) -> Result<(), CoreError> {
    match config.get(field) {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Object(map)) => {
            for (key, value) in map {
                if !value.is_string() {
                    return Err(CoreError::Validation(format!(
                        "config.{field}.{key} must be a string"
                    )));
                }
            }
            Ok(())
        }
        Some(_) => Err(CoreError::Validation(format!(
            "config.{field} must be an object of string values"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn email_config_requires_subject_first() {
        let err = validate_config(ActionType::Email, &json!({})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: config.subject is required"
        );
    }

    #[test]
    fn email_config_accepts_full_shape() {
        let config = json!({
            "subject": "Welcome {{owner_name}}",
            "html_content": "<p>Hello {{owner_name}}</p>",
            "text_content": "Hello {{owner_name}}",
        });
        assert!(validate_config(ActionType::Email, &config).is_ok());
    }

    #[test]
    fn sms_config_requires_message() {
        let err = validate_config(ActionType::Sms, &json!({"msg": "x"})).unwrap_err();
        assert!(err.to_string().contains("config.message is required"));
    }

    #[test]
    fn webhook_config_rejects_invalid_url() {
        let config = json!({"url": "not a url", "method": "POST"});
        let err = validate_config(ActionType::Webhook, &config).unwrap_err();
        assert!(err.to_string().contains("config.url must be a valid URL"));
    }

    #[test]
    fn webhook_config_rejects_unknown_method() {
        let config = json!({"url": "https://example.com/hook", "method": "BREW"});
        let err = validate_config(ActionType::Webhook, &config).unwrap_err();
        assert!(err.to_string().contains("config.method must be one of"));
    }

    #[test]
    fn webhook_config_rejects_non_string_header() {
        let config = json!({
            "url": "https://example.com/hook",
            "method": "POST",
            "headers": {"X-Count": 3},
        });
        let err = validate_config(ActionType::Webhook, &config).unwrap_err();
        assert!(err.to_string().contains("config.headers.X-Count"));
    }

    #[test]
    fn notification_config_requires_title_and_message() {
        let err = validate_config(ActionType::Notification, &json!({"message": "m"})).unwrap_err();
        assert!(err.to_string().contains("config.title is required"));
    }

    #[test]
    fn slack_config_needs_only_message() {
        assert!(validate_config(ActionType::Slack, &json!({"message": "deploy done"})).is_ok());
    }

    #[test]
    fn teams_config_validates_optional_webhook_url() {
        let config = json!({"message": "m", "webhook_url": "nope"});
        let err = validate_config(ActionType::Teams, &config).unwrap_err();
        assert!(err.to_string().contains("config.webhook_url"));
    }

    #[test]
    fn variables_must_map_names_to_string_descriptions() {
        assert!(validate_variables(&json!({"owner_name": "The signer's name"})).is_ok());
        let err = validate_variables(&json!({"count": 2})).unwrap_err();
        assert!(err.to_string().contains("variables.count"));
        let err = validate_variables(&json!(["owner_name"])).unwrap_err();
        assert!(err.to_string().contains("variables must be a JSON object"));
    }
}
