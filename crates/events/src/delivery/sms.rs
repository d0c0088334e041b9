//! SMS delivery via an HTTP gateway.
//!
//! The back office does not speak to carriers directly; it POSTs
//! `{ "to", "message" }` to a provider gateway endpoint configured through
//! the environment. If `SMS_GATEWAY_URL` is not set, [`SmsConfig::from_env`]
//! returns `None` and the SMS channel is unconfigured.

use std::time::Duration;

use super::webhook::WebhookError;

/// HTTP request timeout for a single gateway call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// SmsConfig
// ---------------------------------------------------------------------------

/// Configuration for the SMS gateway.
#[derive(Debug, Clone)]
pub struct SmsConfig {
    /// Gateway endpoint receiving send requests.
    pub gateway_url: String,
    /// Optional bearer token for the gateway.
    pub auth_token: Option<String>,
    /// Optional sender id / short code passed through to the provider.
    pub from_number: Option<String>,
}

impl SmsConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMS_GATEWAY_URL` is not set.
    ///
    /// | Variable            | Required | Default |
    /// |---------------------|----------|---------|
    /// | `SMS_GATEWAY_URL`   | yes      | —       |
    /// | `SMS_GATEWAY_TOKEN` | no       | —       |
    /// | `SMS_FROM_NUMBER`   | no       | —       |
    pub fn from_env() -> Option<Self> {
        let gateway_url = std::env::var("SMS_GATEWAY_URL").ok()?;
        Some(Self {
            gateway_url,
            auth_token: std::env::var("SMS_GATEWAY_TOKEN").ok(),
            from_number: std::env::var("SMS_FROM_NUMBER").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// SmsDelivery
// ---------------------------------------------------------------------------

/// Sends rendered SMS messages through the configured gateway.
pub struct SmsDelivery {
    client: reqwest::Client,
    config: SmsConfig,
}

impl SmsDelivery {
    /// Create a new SMS delivery service with the given configuration.
    pub fn new(config: SmsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client, config }
    }

    /// Send one message to a phone number.
    pub async fn deliver(&self, to_number: &str, message: &str) -> Result<(), WebhookError> {
        let payload = serde_json::json!({
            "to": to_number,
            "from": self.config.from_number,
            "message": message,
        });

        let mut request = self.client.post(&self.config.gateway_url).json(&payload);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }

        tracing::info!(to = to_number, "SMS handed to gateway");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_returns_none_without_gateway_url() {
        std::env::remove_var("SMS_GATEWAY_URL");
        assert!(SmsConfig::from_env().is_none());
    }
}
