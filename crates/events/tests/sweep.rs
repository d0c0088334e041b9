//! Integration tests for the signature expiration sweep: expiry
//! transition + trigger firing, reminder windows, and flag-based
//! idempotency.

use chrono::{Duration, Utc};
use merx_db::models::action_template::CreateActionTemplate;
use merx_db::models::signature_capture::CreateSignatureCapture;
use merx_db::models::trigger::CreateTriggerAction;
use merx_db::repositories::{
    ActionTemplateRepo, OutboxRepo, ProspectRepo, SignatureCaptureRepo, TriggerActionRepo,
    TriggerCatalogRepo,
};
use merx_events::sweep::TRIGGER_SIGNATURE_EXPIRED;
use merx_events::SignatureSweep;
use sqlx::PgPool;

/// Insert a pending signature with the given request/expiry offsets from
/// now (negative = past).
async fn make_signature(
    pool: &PgPool,
    prospect_id: Option<i64>,
    requested_offset: Duration,
    expires_offset: Duration,
) -> i64 {
    let signature = SignatureCaptureRepo::create(
        pool,
        &CreateSignatureCapture {
            prospect_id,
            role_key: Some("owner".to_string()),
            signer_name: Some("Ada Owner".to_string()),
            signer_email: "owner@example.com".to_string(),
            expires_at: None,
        },
    )
    .await
    .unwrap();

    let now = Utc::now();
    SignatureCaptureRepo::set_window(
        pool,
        signature.id,
        now + requested_offset,
        now + expires_offset,
    )
    .await
    .unwrap();

    signature.id
}

// ---------------------------------------------------------------------------
// Reminder windows
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn three_day_reminder_fires_exactly_once(pool: PgPool) {
    // Requested 4 days ago, expires 3 days from now, nothing sent yet.
    let id = make_signature(&pool, None, Duration::days(-4), Duration::days(3)).await;

    let sweep = SignatureSweep::new(pool.clone());
    let stats = sweep.process_once(Utc::now()).await.unwrap();
    assert_eq!(stats.scanned, 1);
    assert_eq!(stats.reminders, 1);
    assert_eq!(stats.expired, 0);

    let signature = SignatureCaptureRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert!(signature.reminder_3day_sent_at.is_some());
    assert!(signature.reminder_1day_sent_at.is_none());
    assert_eq!(signature.status, "requested");

    // One email landed in the outbox for the signer.
    let due = OutboxRepo::claim_due(&pool, Utc::now(), 10).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].channel, "email");
    assert_eq!(due[0].recipient, "owner@example.com");

    // Running the sweep again sends no duplicate.
    let stats = sweep.process_once(Utc::now()).await.unwrap();
    assert_eq!(stats.reminders, 0);
    let again = OutboxRepo::claim_due(&pool, Utc::now(), 10).await.unwrap();
    assert!(again.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn one_day_reminder_uses_its_own_window_and_flag(pool: PgPool) {
    // Requested 6 days ago, expires in ~1 day.
    let id = make_signature(
        &pool,
        None,
        Duration::days(-6),
        Duration::days(1) - Duration::hours(1),
    )
    .await;

    let sweep = SignatureSweep::new(pool.clone());
    let stats = sweep.process_once(Utc::now()).await.unwrap();
    assert_eq!(stats.reminders, 1);

    let signature = SignatureCaptureRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert!(signature.reminder_1day_sent_at.is_some());
    assert!(signature.reminder_3day_sent_at.is_none());

    let due = OutboxRepo::claim_due(&pool, Utc::now(), 10).await.unwrap();
    assert_eq!(due.len(), 1);
    let payload = &due[0].payload;
    assert_eq!(payload["channel"], "email");
    let subject = payload["subject"].as_str().unwrap();
    assert!(subject.contains("expires tomorrow"), "got subject: {subject}");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn fresh_requests_are_left_alone(pool: PgPool) {
    // Requested 2 days ago, expires in 5 days: neither window applies.
    let id = make_signature(&pool, None, Duration::days(-2), Duration::days(5)).await;

    let sweep = SignatureSweep::new(pool.clone());
    let stats = sweep.process_once(Utc::now()).await.unwrap();

    assert_eq!(stats.scanned, 1);
    assert_eq!(stats.reminders, 0);
    assert_eq!(stats.expired, 0);

    let signature = SignatureCaptureRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert!(signature.reminder_3day_sent_at.is_none());
    assert!(signature.reminder_1day_sent_at.is_none());
}

// ---------------------------------------------------------------------------
// Expiry
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn expired_request_transitions_and_fires_trigger_with_company_context(pool: PgPool) {
    let prospect = ProspectRepo::create(
        &pool,
        Some("Acme Foods"),
        Some("Ada Owner"),
        Some("owner@example.com"),
        Some("Grace Agent"),
    )
    .await
    .unwrap();

    // Attach an email action to the seeded signature_expired trigger.
    let trigger = TriggerCatalogRepo::find_active_by_key(&pool, TRIGGER_SIGNATURE_EXPIRED)
        .await
        .unwrap()
        .expect("signature_expired is seeded by migrations");
    let template = ActionTemplateRepo::create(
        &pool,
        &CreateActionTemplate {
            name: "Signature expired notice".to_string(),
            description: None,
            action_type: "email".to_string(),
            category: None,
            config: serde_json::json!({
                "subject": "Signature request for {{company_name}} expired",
                "html_content": "<p>{{owner_name}}, the request sent by {{agent_name}} expired.</p>",
            }),
            variables: None,
            is_active: None,
        },
    )
    .await
    .unwrap();
    TriggerActionRepo::create(
        &pool,
        trigger.id,
        &CreateTriggerAction {
            template_id: template.id,
            sequence_order: None,
            delay_seconds: None,
            requires_email_preference: None,
            requires_sms_preference: None,
            retry_on_failure: None,
            max_retries: None,
            is_active: None,
        },
    )
    .await
    .unwrap();

    let id = make_signature(
        &pool,
        Some(prospect.id),
        Duration::days(-8),
        Duration::hours(-1),
    )
    .await;

    let sweep = SignatureSweep::new(pool.clone());
    let stats = sweep.process_once(Utc::now()).await.unwrap();
    assert_eq!(stats.expired, 1);

    let signature = SignatureCaptureRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(signature.status, "expired");
    assert!(signature
        .notes
        .as_deref()
        .is_some_and(|n| n.contains("expired")));

    // The trigger fired with the resolved company name in the context.
    let entries = OutboxRepo::list_for_trigger(&pool, TRIGGER_SIGNATURE_EXPIRED)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    let subject = entries[0].payload["subject"].as_str().unwrap();
    assert_eq!(subject, "Signature request for Acme Foods expired");
    assert_eq!(entries[0].recipient, "owner@example.com");

    // A second pass finds nothing pending.
    let stats = sweep.process_once(Utc::now()).await.unwrap();
    assert_eq!(stats.scanned, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn expiry_without_prospect_uses_default_context(pool: PgPool) {
    // No prospect and no configured trigger actions: the request still
    // expires cleanly with zero outbound sends.
    let id = make_signature(&pool, None, Duration::days(-8), Duration::hours(-2)).await;

    let sweep = SignatureSweep::new(pool.clone());
    let stats = sweep.process_once(Utc::now()).await.unwrap();
    assert_eq!(stats.expired, 1);

    let signature = SignatureCaptureRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(signature.status, "expired");
    assert!(OutboxRepo::list_for_trigger(&pool, TRIGGER_SIGNATURE_EXPIRED)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn one_bad_signature_does_not_halt_the_sweep(pool: PgPool) {
    // Two pending requests: one expiring, one due a 3-day reminder. Both
    // must be handled in a single pass.
    let expiring = make_signature(&pool, None, Duration::days(-8), Duration::hours(-1)).await;
    let reminding = make_signature(&pool, None, Duration::days(-4), Duration::days(3)).await;

    let sweep = SignatureSweep::new(pool.clone());
    let stats = sweep.process_once(Utc::now()).await.unwrap();

    assert_eq!(stats.scanned, 2);
    assert_eq!(stats.expired, 1);
    assert_eq!(stats.reminders, 1);

    let expired = SignatureCaptureRepo::find_by_id(&pool, expiring).await.unwrap().unwrap();
    assert_eq!(expired.status, "expired");
    let reminded = SignatureCaptureRepo::find_by_id(&pool, reminding).await.unwrap().unwrap();
    assert!(reminded.reminder_3day_sent_at.is_some());
}
