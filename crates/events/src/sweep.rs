//! Signature expiration sweep.
//!
//! Periodically scans pending e-signature requests. Requests past their
//! expiry window are transitioned to `expired` and fire the
//! `signature_expired` trigger; requests approaching expiry get a 3-day and
//! a 1-day reminder email, each at most once per request. The reminders are
//! rendered from built-in templates and enqueued straight to the outbox —
//! a deliberate second code path that does not depend on the trigger
//! catalog being configured.

use std::time::Duration;

use chrono::Utc;
use merx_core::render::render_template;
use merx_core::types::Timestamp;
use merx_db::models::outbox::NewOutboxEntry;
use merx_db::models::signature_capture::SignatureCapture;
use merx_db::repositories::{OutboxRepo, ProspectRepo, SignatureCaptureRepo};
use merx_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::context::{TriggerContext, KEY_RECIPIENT_EMAIL};
use crate::dispatcher::TriggerDispatcher;
use crate::payload::OutboundPayload;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(6 * 3600);

/// Trigger fired when a request passes its expiry window.
pub const TRIGGER_SIGNATURE_EXPIRED: &str = "signature_expired";

/// Fallback company name when no prospect record resolves.
const DEFAULT_COMPANY_NAME: &str = "Merchant Application";

/// Fallback agent display name when no creator resolves.
const DEFAULT_AGENT_NAME: &str = "Agent";

// Built-in reminder templates, rendered with the same `{{variable}}`
// substitution as catalog templates.
const REMINDER_3DAY_SUBJECT: &str =
    "Reminder: your signature for {{company_name}} expires in 3 days";
const REMINDER_3DAY_HTML: &str = "<p>Hello {{owner_name}},</p>\
<p>The e-signature request for {{company_name}}, sent by {{agent_name}} on \
{{original_request_date}}, expires in 3 days. Please sign at your earliest \
convenience.</p>";

const REMINDER_1DAY_SUBJECT: &str =
    "Final reminder: your signature for {{company_name}} expires tomorrow";
const REMINDER_1DAY_HTML: &str = "<p>Hello {{owner_name}},</p>\
<p>The e-signature request for {{company_name}}, sent by {{agent_name}} on \
{{original_request_date}}, expires tomorrow. This is the final reminder.</p>";

// ---------------------------------------------------------------------------
// SweepStats
// ---------------------------------------------------------------------------

/// Counts from one sweep pass, for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    /// Requests examined.
    pub scanned: usize,
    /// Requests transitioned to `expired`.
    pub expired: usize,
    /// Reminder emails enqueued.
    pub reminders: usize,
}

// ---------------------------------------------------------------------------
// SignatureSweep
// ---------------------------------------------------------------------------

/// Background service that expires and reminds pending signature requests.
pub struct SignatureSweep {
    pool: DbPool,
    dispatcher: TriggerDispatcher,
}

impl SignatureSweep {
    /// Create a sweep over the given pool.
    pub fn new(pool: DbPool) -> Self {
        let dispatcher = TriggerDispatcher::new(pool.clone());
        Self { pool, dispatcher }
    }

    /// Run the sweep loop until `cancel` is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = SWEEP_INTERVAL.as_secs(),
            "Signature sweep started"
        );
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Signature sweep stopping");
                    break;
                }
                _ = interval.tick() => {
                    match self.process_once(Utc::now()).await {
                        Ok(stats) if stats.scanned > 0 => {
                            tracing::info!(
                                scanned = stats.scanned,
                                expired = stats.expired,
                                reminders = stats.reminders,
                                "Signature sweep pass complete"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::error!(error = %e, "Signature sweep pass failed");
                        }
                    }
                }
            }
        }
    }

    /// Run one sweep pass at the given instant.
    ///
    /// A failure on one signature is logged and never halts the pass.
    pub async fn process_once(&self, now: Timestamp) -> Result<SweepStats, sqlx::Error> {
        let pending = SignatureCaptureRepo::list_requested(&self.pool).await?;

        let mut stats = SweepStats {
            scanned: pending.len(),
            ..SweepStats::default()
        };

        for signature in &pending {
            match self.process_signature(signature, now).await {
                Ok(SignatureOutcome::Expired) => stats.expired += 1,
                Ok(SignatureOutcome::ReminderSent) => stats.reminders += 1,
                Ok(SignatureOutcome::Untouched) => {}
                Err(e) => {
                    tracing::error!(
                        signature_id = signature.id,
                        error = %e,
                        "Failed to process signature request"
                    );
                }
            }
        }

        Ok(stats)
    }

    /// Handle one pending request: expire it or send a due reminder.
    async fn process_signature(
        &self,
        signature: &SignatureCapture,
        now: Timestamp,
    ) -> Result<SignatureOutcome, sqlx::Error> {
        if now >= signature.expires_at {
            return self.expire(signature).await;
        }

        let seconds_left = (signature.expires_at - now).num_seconds();
        let days_until_expiration = (seconds_left + 86_399) / 86_400;
        let days_since_request = (now - signature.requested_at).num_seconds() / 86_400;

        if days_until_expiration == 3
            && days_since_request >= 4
            && signature.reminder_3day_sent_at.is_none()
        {
            return self
                .send_reminder(signature, now, Reminder::ThreeDay)
                .await;
        }

        if days_until_expiration == 1
            && days_since_request >= 6
            && signature.reminder_1day_sent_at.is_none()
        {
            return self.send_reminder(signature, now, Reminder::OneDay).await;
        }

        Ok(SignatureOutcome::Untouched)
    }

    /// Expire a request and fire `signature_expired` with resolved context.
    async fn expire(
        &self,
        signature: &SignatureCapture,
    ) -> Result<SignatureOutcome, sqlx::Error> {
        let transitioned = SignatureCaptureRepo::mark_expired(
            &self.pool,
            signature.id,
            "Signature request expired without completion.",
        )
        .await?;

        if !transitioned {
            // Another sweep got here first.
            return Ok(SignatureOutcome::Untouched);
        }

        let context = self.resolve_context(signature).await?;
        self.dispatcher
            .fire(TRIGGER_SIGNATURE_EXPIRED, &context)
            .await;

        tracing::info!(
            signature_id = signature.id,
            signer = %signature.signer_email,
            "Signature request expired"
        );
        Ok(SignatureOutcome::Expired)
    }

    /// Stamp the reminder flag and, if this pass won the stamp, enqueue the
    /// reminder email.
    ///
    /// The flag is stamped first: the `WHERE ... IS NULL` update is atomic,
    /// so overlapping sweep runs send each reminder at most once.
    async fn send_reminder(
        &self,
        signature: &SignatureCapture,
        now: Timestamp,
        reminder: Reminder,
    ) -> Result<SignatureOutcome, sqlx::Error> {
        let stamped = match reminder {
            Reminder::ThreeDay => {
                SignatureCaptureRepo::mark_3day_reminder_sent(&self.pool, signature.id).await?
            }
            Reminder::OneDay => {
                SignatureCaptureRepo::mark_1day_reminder_sent(&self.pool, signature.id).await?
            }
        };
        if !stamped {
            return Ok(SignatureOutcome::Untouched);
        }

        let context = self.resolve_context(signature).await?;
        let values = context.values();
        let (subject_template, html_template) = match reminder {
            Reminder::ThreeDay => (REMINDER_3DAY_SUBJECT, REMINDER_3DAY_HTML),
            Reminder::OneDay => (REMINDER_1DAY_SUBJECT, REMINDER_1DAY_HTML),
        };

        let payload = OutboundPayload::Email {
            subject: render_template(subject_template, values),
            html: render_template(html_template, values),
            text: None,
        };
        let payload_json =
            serde_json::to_value(&payload).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        OutboxRepo::enqueue(
            &self.pool,
            &NewOutboxEntry {
                channel: payload.channel(),
                recipient: &signature.signer_email,
                payload: &payload_json,
                trigger_key: None,
                template_id: None,
                not_before: now,
                attempts_remaining: 1,
            },
        )
        .await?;

        tracing::info!(
            signature_id = signature.id,
            signer = %signature.signer_email,
            reminder = reminder.label(),
            "Signature reminder enqueued"
        );
        Ok(SignatureOutcome::ReminderSent)
    }

    /// Resolve the display context for a request from its prospect record,
    /// with back-office defaults when fields are absent.
    async fn resolve_context(
        &self,
        signature: &SignatureCapture,
    ) -> Result<TriggerContext, sqlx::Error> {
        let prospect = match signature.prospect_id {
            Some(id) => ProspectRepo::find_by_id(&self.pool, id).await?,
            None => None,
        };

        let company_name = prospect
            .as_ref()
            .and_then(|p| p.business_name.clone())
            .unwrap_or_else(|| DEFAULT_COMPANY_NAME.to_string());
        let agent_name = prospect
            .as_ref()
            .and_then(|p| p.created_by_name.clone())
            .unwrap_or_else(|| DEFAULT_AGENT_NAME.to_string());
        let owner_name = signature
            .signer_name
            .clone()
            .or_else(|| prospect.as_ref().and_then(|p| p.contact_name.clone()))
            .unwrap_or_else(|| "Signer".to_string());

        Ok(TriggerContext::new()
            .with(KEY_RECIPIENT_EMAIL, &signature.signer_email)
            .with("owner_name", owner_name)
            .with("owner_email", &signature.signer_email)
            .with("company_name", company_name)
            .with("role_key", &signature.role_key)
            .with(
                "original_request_date",
                signature.requested_at.format("%B %d, %Y").to_string(),
            )
            .with("agent_name", agent_name))
    }
}

/// What one sweep pass did with a signature request.
enum SignatureOutcome {
    Expired,
    ReminderSent,
    Untouched,
}

/// Which reminder is being sent.
#[derive(Debug, Clone, Copy)]
enum Reminder {
    ThreeDay,
    OneDay,
}

impl Reminder {
    fn label(&self) -> &'static str {
        match self {
            Reminder::ThreeDay => "3-day",
            Reminder::OneDay => "1-day",
        }
    }
}
