//! External delivery channels (SMTP, webhook, SMS gateway, Slack/Teams).
//!
//! Each sender performs exactly one delivery attempt; retry policy lives in
//! the outbox worker, not here.

pub mod chat;
pub mod email;
pub mod sms;
pub mod webhook;

pub use chat::ChatDelivery;
pub use email::{EmailConfig, EmailDelivery};
pub use sms::{SmsConfig, SmsDelivery};
pub use webhook::WebhookDelivery;

/// Error type spanning all delivery channels.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Email(#[from] email::EmailError),

    #[error(transparent)]
    Webhook(#[from] webhook::WebhookError),

    #[error(transparent)]
    Chat(#[from] chat::ChatError),

    /// The channel's transport is not configured in this deployment.
    #[error("Channel not configured: {0}")]
    NotConfigured(&'static str),

    /// The stored outbox payload could not be decoded or is incomplete.
    #[error("Malformed outbox payload: {0}")]
    Payload(String),

    /// Database failure while completing an in-app delivery.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The full set of channel senders, constructed once at startup.
///
/// Email and SMS are optional: when their environment configuration is
/// absent, sends on those channels fail with
/// [`DeliveryError::NotConfigured`] and are retried/failed like any other
/// delivery error.
pub struct Senders {
    pub email: Option<EmailDelivery>,
    pub sms: Option<SmsDelivery>,
    pub webhook: WebhookDelivery,
    pub chat: ChatDelivery,
}

impl Senders {
    /// Build all senders from environment configuration.
    pub fn from_env() -> Self {
        Self {
            email: EmailConfig::from_env().map(EmailDelivery::new),
            sms: SmsConfig::from_env().map(SmsDelivery::new),
            webhook: WebhookDelivery::from_env(),
            chat: ChatDelivery::from_env(),
        }
    }
}
