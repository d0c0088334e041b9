//! Trigger dispatch: from a fired trigger key to enqueued outbound sends.
//!
//! [`TriggerDispatcher::fire`] is fire-and-forget: call sites fire triggers
//! speculatively for events that may have no configured actions, so an
//! unknown or inactive key is a silent skip and no failure ever propagates
//! back to the firer. The dispatcher decides *what* to send — resolving the
//! action list, gating on recipient preferences, rendering templates — and
//! enqueues the rendered payloads to the dispatch outbox; the outbox worker
//! owns actually sending them (including `delay_seconds` and retry).

use chrono::Utc;
use merx_core::channels::{ActionType, STATUS_FAILED, STATUS_SKIPPED};
use merx_db::models::action_template::ActionTemplate;
use merx_db::models::activity::NewActivityEntry;
use merx_db::models::outbox::NewOutboxEntry;
use merx_db::models::trigger::TriggerAction;
use merx_db::repositories::{
    ActionTemplateRepo, ActivityRepo, ContactPreferenceRepo, OutboxRepo, TriggerActionRepo,
    TriggerCatalogRepo,
};
use merx_db::DbPool;

use crate::context::{TriggerContext, KEY_RECIPIENT_EMAIL, KEY_RECIPIENT_PHONE};
use crate::payload::render_action;

// ---------------------------------------------------------------------------
// DispatchSummary
// ---------------------------------------------------------------------------

/// Per-firing counts, mostly for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Actions whose rendered payload was enqueued for delivery.
    pub enqueued: usize,
    /// Actions skipped (recipient opt-out, inactive/missing template).
    pub skipped: usize,
    /// Actions that failed to render or enqueue.
    pub failed: usize,
}

// ---------------------------------------------------------------------------
// TriggerDispatcher
// ---------------------------------------------------------------------------

/// Resolves fired trigger keys into enqueued outbound communications.
#[derive(Clone)]
pub struct TriggerDispatcher {
    pool: DbPool,
}

impl TriggerDispatcher {
    /// Create a dispatcher over the given database pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Fire a trigger. Never returns an error: failures are logged and the
    /// firing code path continues unaffected.
    pub async fn fire(&self, trigger_key: &str, context: &TriggerContext) {
        match self.dispatch(trigger_key, context).await {
            Ok(summary) => {
                if summary != DispatchSummary::default() {
                    tracing::info!(
                        trigger_key,
                        enqueued = summary.enqueued,
                        skipped = summary.skipped,
                        failed = summary.failed,
                        "Trigger dispatched"
                    );
                }
            }
            Err(e) => {
                tracing::error!(trigger_key, error = %e, "Trigger dispatch failed");
            }
        }
    }

    /// Dispatch a trigger firing and report what happened.
    ///
    /// An unknown or inactive `trigger_key` returns an empty summary and
    /// records nothing. An error from one action never prevents the
    /// remaining actions from being processed.
    pub async fn dispatch(
        &self,
        trigger_key: &str,
        context: &TriggerContext,
    ) -> Result<DispatchSummary, sqlx::Error> {
        let Some(trigger) = TriggerCatalogRepo::find_active_by_key(&self.pool, trigger_key).await?
        else {
            tracing::debug!(trigger_key, "Trigger not configured, skipping");
            return Ok(DispatchSummary::default());
        };

        let actions = TriggerActionRepo::list_active_for_trigger(&self.pool, trigger.id).await?;

        let mut summary = DispatchSummary::default();
        for action in &actions {
            match self.process_action(trigger_key, action, context).await {
                Ok(Outcome::Enqueued) => summary.enqueued += 1,
                Ok(Outcome::Skipped) => summary.skipped += 1,
                Ok(Outcome::Failed) => summary.failed += 1,
                Err(e) => {
                    // Failure isolation: log and move on to the next action.
                    summary.failed += 1;
                    tracing::error!(
                        trigger_key,
                        trigger_action_id = action.id,
                        error = %e,
                        "Trigger action processing failed"
                    );
                }
            }
        }

        Ok(summary)
    }

    /// Process a single trigger action: preference gate, render, enqueue.
    async fn process_action(
        &self,
        trigger_key: &str,
        action: &TriggerAction,
        context: &TriggerContext,
    ) -> Result<Outcome, sqlx::Error> {
        let template = ActionTemplateRepo::find_by_id(&self.pool, action.template_id).await?;

        let Some(template) = template.filter(|t| t.is_active) else {
            self.log_skip(trigger_key, action, context, "template inactive or missing")
                .await?;
            return Ok(Outcome::Skipped);
        };

        if let Some(reason) = self.preference_block(action, context).await? {
            self.log_skip_for_template(trigger_key, &template, context, reason)
                .await?;
            return Ok(Outcome::Skipped);
        }

        let (recipient, payload) = match render_action(&template, context) {
            Ok(rendered) => rendered,
            Err(e) => {
                ActivityRepo::record(
                    &self.pool,
                    &NewActivityEntry {
                        channel: &template.action_type,
                        recipient: context.get(KEY_RECIPIENT_EMAIL).unwrap_or("-"),
                        summary: Some(&template.name),
                        status: STATUS_FAILED,
                        detail: Some(&e.to_string()),
                        trigger_key: Some(trigger_key),
                        template_id: Some(template.id),
                    },
                )
                .await?;
                return Ok(Outcome::Failed);
            }
        };

        let payload_json = serde_json::to_value(&payload).map_err(|e| {
            sqlx::Error::Encode(Box::new(e))
        })?;
        let attempts = if action.retry_on_failure {
            action.max_retries.max(0) + 1
        } else {
            1
        };
        let not_before = Utc::now() + chrono::Duration::seconds(action.delay_seconds.max(0) as i64);

        OutboxRepo::enqueue(
            &self.pool,
            &NewOutboxEntry {
                channel: payload.channel(),
                recipient: &recipient,
                payload: &payload_json,
                trigger_key: Some(trigger_key),
                template_id: Some(template.id),
                not_before,
                attempts_remaining: attempts,
            },
        )
        .await?;

        Ok(Outcome::Enqueued)
    }

    /// Check the delivery-preference gates on an action.
    ///
    /// Returns the skip reason when the channel-appropriate recipient has
    /// opted out. A recipient without a preference row is opted in, and a
    /// missing context key fails later at render time instead.
    async fn preference_block(
        &self,
        action: &TriggerAction,
        context: &TriggerContext,
    ) -> Result<Option<&'static str>, sqlx::Error> {
        if action.requires_email_preference {
            if let Some(email) = context.get(KEY_RECIPIENT_EMAIL) {
                let prefs = ContactPreferenceRepo::find_by_recipient(&self.pool, email).await?;
                if prefs.is_some_and(|p| p.email_opt_out) {
                    return Ok(Some("recipient opted out of email"));
                }
            }
        }

        if action.requires_sms_preference {
            if let Some(phone) = context.get(KEY_RECIPIENT_PHONE) {
                let prefs = ContactPreferenceRepo::find_by_recipient(&self.pool, phone).await?;
                if prefs.is_some_and(|p| p.sms_opt_out) {
                    return Ok(Some("recipient opted out of sms"));
                }
            }
        }

        Ok(None)
    }

    async fn log_skip(
        &self,
        trigger_key: &str,
        action: &TriggerAction,
        context: &TriggerContext,
        reason: &str,
    ) -> Result<(), sqlx::Error> {
        ActivityRepo::record(
            &self.pool,
            &NewActivityEntry {
                channel: "unknown",
                recipient: context.get(KEY_RECIPIENT_EMAIL).unwrap_or("-"),
                summary: None,
                status: STATUS_SKIPPED,
                detail: Some(reason),
                trigger_key: Some(trigger_key),
                template_id: Some(action.template_id),
            },
        )
        .await?;
        Ok(())
    }

    async fn log_skip_for_template(
        &self,
        trigger_key: &str,
        template: &ActionTemplate,
        context: &TriggerContext,
        reason: &str,
    ) -> Result<(), sqlx::Error> {
        let recipient = match template.action_type.parse::<ActionType>() {
            Ok(ActionType::Sms) => context.get(KEY_RECIPIENT_PHONE),
            _ => context.get(KEY_RECIPIENT_EMAIL),
        };
        ActivityRepo::record(
            &self.pool,
            &NewActivityEntry {
                channel: &template.action_type,
                recipient: recipient.unwrap_or("-"),
                summary: Some(&template.name),
                status: STATUS_SKIPPED,
                detail: Some(reason),
                trigger_key: Some(trigger_key),
                template_id: Some(template.id),
            },
        )
        .await?;
        Ok(())
    }
}

/// What happened to one trigger action during a firing.
enum Outcome {
    Enqueued,
    Skipped,
    Failed,
}
