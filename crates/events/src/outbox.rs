//! Dispatch outbox worker.
//!
//! Polls `dispatch_outbox` for due entries and owns delivery: one claim is
//! one attempt, every attempt is logged to the dispatch log, and failures
//! are rescheduled with exponential backoff until the entry runs out of
//! attempts. Entries are claimed with `FOR UPDATE SKIP LOCKED` plus a
//! lease, so the API process and standalone workers can poll concurrently.

use std::time::Duration;

use chrono::Utc;
use merx_core::channels::{STATUS_FAILED, STATUS_SENT};
use merx_core::types::Timestamp;
use merx_db::models::activity::NewActivityEntry;
use merx_db::models::outbox::OutboxEntry;
use merx_db::repositories::{ActivityRepo, NotificationRepo, OutboxRepo};
use merx_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::delivery::{DeliveryError, Senders};
use crate::payload::OutboundPayload;

/// How often the worker polls for due entries.
const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Maximum entries claimed per poll.
const CLAIM_BATCH_SIZE: i64 = 50;

/// Base delay for the first retry.
const RETRY_BASE_SECS: i64 = 60;

/// Ceiling on the retry backoff delay.
const MAX_RETRY_BACKOFF_SECS: i64 = 3_600;

/// Compute the retry delay in seconds using exponential backoff.
///
/// Follows `RETRY_BASE_SECS * 2^(attempts_made - 1)`, capped at
/// [`MAX_RETRY_BACKOFF_SECS`].
fn retry_delay_secs(attempts_made: i32) -> i64 {
    let exponent = attempts_made.max(1) as u32 - 1;
    RETRY_BASE_SECS
        .saturating_mul(2i64.saturating_pow(exponent))
        .min(MAX_RETRY_BACKOFF_SECS)
}

// ---------------------------------------------------------------------------
// OutboxWorker
// ---------------------------------------------------------------------------

/// Background service that delivers enqueued outbound payloads.
pub struct OutboxWorker {
    pool: DbPool,
    senders: Senders,
}

impl OutboxWorker {
    /// Create a worker over the given pool and channel senders.
    pub fn new(pool: DbPool, senders: Senders) -> Self {
        Self { pool, senders }
    }

    /// Run the polling loop until `cancel` is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = POLL_INTERVAL.as_secs(),
            "Outbox worker started"
        );
        let mut interval = tokio::time::interval(POLL_INTERVAL);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Outbox worker stopping");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.process_due(Utc::now()).await {
                        tracing::error!(error = %e, "Outbox poll failed");
                    }
                }
            }
        }
    }

    /// Claim and process every due entry. Returns how many were claimed.
    ///
    /// An error handling one entry never aborts the rest of the batch.
    pub async fn process_due(&self, now: Timestamp) -> Result<usize, sqlx::Error> {
        let entries = OutboxRepo::claim_due(&self.pool, now, CLAIM_BATCH_SIZE).await?;
        let claimed = entries.len();

        for entry in entries {
            if let Err(e) = self.handle_entry(&entry, now).await {
                tracing::error!(outbox_id = entry.id, error = %e, "Outbox entry bookkeeping failed");
            }
        }

        if claimed > 0 {
            tracing::debug!(claimed, "Outbox batch processed");
        }
        Ok(claimed)
    }

    /// Attempt one entry and record the outcome.
    async fn handle_entry(&self, entry: &OutboxEntry, now: Timestamp) -> Result<(), sqlx::Error> {
        let outcome = self.send(entry).await;

        match outcome {
            Ok(summary) => {
                OutboxRepo::mark_sent(&self.pool, entry.id).await?;
                ActivityRepo::record(
                    &self.pool,
                    &NewActivityEntry {
                        channel: &entry.channel,
                        recipient: &entry.recipient,
                        summary: Some(&summary),
                        status: STATUS_SENT,
                        detail: None,
                        trigger_key: entry.trigger_key.as_deref(),
                        template_id: entry.template_id,
                    },
                )
                .await?;
            }
            Err(e) => {
                let error_text = e.to_string();
                ActivityRepo::record(
                    &self.pool,
                    &NewActivityEntry {
                        channel: &entry.channel,
                        recipient: &entry.recipient,
                        summary: None,
                        status: STATUS_FAILED,
                        detail: Some(&error_text),
                        trigger_key: entry.trigger_key.as_deref(),
                        template_id: entry.template_id,
                    },
                )
                .await?;

                // `attempts_remaining` was decremented at claim time, so it
                // already reflects what is left after this attempt.
                if entry.attempts_remaining > 0 {
                    let delay = retry_delay_secs(entry.attempts_made);
                    let not_before = now + chrono::Duration::seconds(delay);
                    tracing::warn!(
                        outbox_id = entry.id,
                        attempts_remaining = entry.attempts_remaining,
                        retry_in_secs = delay,
                        error = %error_text,
                        "Delivery failed, retry scheduled"
                    );
                    OutboxRepo::reschedule(&self.pool, entry.id, not_before, &error_text).await?;
                } else {
                    tracing::error!(
                        outbox_id = entry.id,
                        error = %error_text,
                        "Delivery failed permanently"
                    );
                    OutboxRepo::mark_failed(&self.pool, entry.id, &error_text).await?;
                }
            }
        }

        Ok(())
    }

    /// Decode the stored payload and invoke the matching channel sender.
    ///
    /// Returns the dispatch log summary on success.
    async fn send(&self, entry: &OutboxEntry) -> Result<String, DeliveryError> {
        let payload: OutboundPayload = serde_json::from_value(entry.payload.clone())
            .map_err(|e| DeliveryError::Payload(e.to_string()))?;
        let summary = payload.summary();

        match payload {
            OutboundPayload::Email { subject, html, text } => {
                let email = self
                    .senders
                    .email
                    .as_ref()
                    .ok_or(DeliveryError::NotConfigured("email"))?;
                email
                    .deliver(&entry.recipient, &subject, &html, text.as_deref())
                    .await?;
            }
            OutboundPayload::Sms { message } => {
                let sms = self
                    .senders
                    .sms
                    .as_ref()
                    .ok_or(DeliveryError::NotConfigured("sms"))?;
                sms.deliver(&entry.recipient, &message).await?;
            }
            OutboundPayload::Webhook {
                url,
                method,
                headers,
                body,
            } => {
                self.senders
                    .webhook
                    .deliver(&url, &method, &headers, body.as_deref())
                    .await?;
            }
            OutboundPayload::Notification { title, message } => {
                NotificationRepo::create(&self.pool, &entry.recipient, &title, &message).await?;
            }
            OutboundPayload::Slack {
                webhook_url,
                channel,
                title,
                message,
            } => {
                self.senders
                    .chat
                    .deliver_slack(
                        webhook_url.as_deref(),
                        channel.as_deref(),
                        title.as_deref(),
                        &message,
                    )
                    .await?;
            }
            OutboundPayload::Teams {
                webhook_url,
                title,
                message,
            } => {
                self.senders
                    .chat
                    .deliver_teams(webhook_url.as_deref(), title.as_deref(), &message)
                    .await?;
            }
        }

        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
