//! Webhook delivery: one HTTP request per attempt.
//!
//! [`WebhookDelivery`] sends a rendered payload to an external URL with the
//! configured method, headers, and body. When a signing secret is
//! configured, the request carries an HMAC-SHA256 signature of the body in
//! the `X-Merx-Signature` header so receivers can authenticate the source.

use std::collections::BTreeMap;
use std::time::Duration;

use merx_core::api_keys::compute_webhook_hmac;

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Header carrying the HMAC-SHA256 signature of the request body.
pub const SIGNATURE_HEADER: &str = "X-Merx-Signature";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),

    /// The configured HTTP method is not a valid method token.
    #[error("Invalid HTTP method: {0}")]
    Method(String),
}

// ---------------------------------------------------------------------------
// WebhookDelivery
// ---------------------------------------------------------------------------

/// Delivers rendered payloads to external webhook endpoints.
pub struct WebhookDelivery {
    client: reqwest::Client,
    signing_secret: Option<String>,
}

impl WebhookDelivery {
    /// Create a delivery service with an optional body-signing secret.
    pub fn new(signing_secret: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            signing_secret,
        }
    }

    /// Build from environment: `WEBHOOK_SIGNING_SECRET` enables signing.
    pub fn from_env() -> Self {
        Self::new(std::env::var("WEBHOOK_SIGNING_SECRET").ok())
    }

    /// Execute a single request and check the response status.
    pub async fn deliver(
        &self,
        url: &str,
        method: &str,
        headers: &BTreeMap<String, String>,
        body: Option<&str>,
    ) -> Result<(), WebhookError> {
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|_| WebhookError::Method(method.to_string()))?;

        let mut request = self.client.request(method, url);

        for (name, value) in headers {
            request = request.header(name, value);
        }

        if let Some(body) = body {
            if let Some(secret) = &self.signing_secret {
                request = request.header(SIGNATURE_HEADER, compute_webhook_hmac(secret, body));
            }
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body.to_string());
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }

        tracing::info!(url, "Webhook delivered");
        Ok(())
    }

    /// POST a JSON value to a URL. Used by the Slack/Teams adapters.
    pub(crate) async fn post_json(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<(), WebhookError> {
        let response = self.client.post(url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
