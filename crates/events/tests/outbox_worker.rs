//! Integration tests for the outbox worker: claiming, per-attempt logging,
//! retry backoff, and permanent failure.

use chrono::{Duration, Utc};
use merx_db::models::activity::ActivityListParams;
use merx_db::models::outbox::NewOutboxEntry;
use merx_db::repositories::{ActivityRepo, NotificationRepo, OutboxRepo};
use merx_events::delivery::{ChatDelivery, Senders, WebhookDelivery};
use merx_events::OutboxWorker;
use sqlx::PgPool;

/// Senders with no email/SMS transport; webhook calls hit a closed local
/// port and fail fast without leaving the machine.
fn offline_senders() -> Senders {
    Senders {
        email: None,
        sms: None,
        webhook: WebhookDelivery::new(None),
        chat: ChatDelivery::new(None, None),
    }
}

async fn enqueue_webhook(pool: &PgPool, attempts: i32) -> i64 {
    let payload = serde_json::json!({
        "channel": "webhook",
        "url": "http://127.0.0.1:1/hook",
        "method": "POST",
        "body": "{}",
    });
    OutboxRepo::enqueue(
        pool,
        &NewOutboxEntry {
            channel: "webhook",
            recipient: "http://127.0.0.1:1/hook",
            payload: &payload,
            trigger_key: Some("merchant_approved"),
            template_id: None,
            not_before: Utc::now() - Duration::seconds(1),
            attempts_remaining: attempts,
        },
    )
    .await
    .unwrap()
}

async fn failed_activity_count(pool: &PgPool) -> usize {
    ActivityRepo::list(
        pool,
        &ActivityListParams {
            channel: None,
            status: Some("failed".to_string()),
            recipient: None,
            limit: None,
            offset: None,
        },
    )
    .await
    .unwrap()
    .len()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_attempt_is_logged_and_rescheduled(pool: PgPool) {
    let id = enqueue_webhook(&pool, 2).await;
    let worker = OutboxWorker::new(pool.clone(), offline_senders());

    let claimed = worker.process_due(Utc::now()).await.unwrap();
    assert_eq!(claimed, 1);

    let entry = OutboxRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(entry.status, "pending");
    assert_eq!(entry.attempts_remaining, 1);
    assert_eq!(entry.attempts_made, 1);
    assert!(entry.last_error.is_some());
    // Rescheduled into the future with backoff.
    assert!(entry.not_before > Utc::now());

    assert_eq!(failed_activity_count(&pool).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn exhausted_attempts_mark_the_entry_failed(pool: PgPool) {
    let id = enqueue_webhook(&pool, 2).await;
    let worker = OutboxWorker::new(pool.clone(), offline_senders());

    // First attempt fails and reschedules; claim again past the backoff.
    worker.process_due(Utc::now()).await.unwrap();
    let claimed = worker.process_due(Utc::now() + Duration::hours(2)).await.unwrap();
    assert_eq!(claimed, 1);

    let entry = OutboxRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(entry.status, "failed");
    assert_eq!(entry.attempts_remaining, 0);
    assert_eq!(entry.attempts_made, 2);

    // Every attempt got its own dispatch log row.
    assert_eq!(failed_activity_count(&pool).await, 2);

    // A further poll finds nothing to claim.
    let claimed = worker.process_due(Utc::now() + Duration::hours(4)).await.unwrap();
    assert_eq!(claimed, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn future_entries_are_not_claimed(pool: PgPool) {
    let payload = serde_json::json!({
        "channel": "webhook",
        "url": "http://127.0.0.1:1/hook",
        "method": "POST",
    });
    OutboxRepo::enqueue(
        &pool,
        &NewOutboxEntry {
            channel: "webhook",
            recipient: "http://127.0.0.1:1/hook",
            payload: &payload,
            trigger_key: None,
            template_id: None,
            not_before: Utc::now() + Duration::minutes(10),
            attempts_remaining: 1,
        },
    )
    .await
    .unwrap();

    let worker = OutboxWorker::new(pool.clone(), offline_senders());
    let claimed = worker.process_due(Utc::now()).await.unwrap();
    assert_eq!(claimed, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn notification_payload_is_stored_in_app(pool: PgPool) {
    let payload = serde_json::json!({
        "channel": "notification",
        "title": "Application approved",
        "message": "Acme Foods is ready to process payments.",
    });
    let id = OutboxRepo::enqueue(
        &pool,
        &NewOutboxEntry {
            channel: "notification",
            recipient: "owner@example.com",
            payload: &payload,
            trigger_key: None,
            template_id: None,
            not_before: Utc::now() - Duration::seconds(1),
            attempts_remaining: 1,
        },
    )
    .await
    .unwrap();

    let worker = OutboxWorker::new(pool.clone(), offline_senders());
    worker.process_due(Utc::now()).await.unwrap();

    let entry = OutboxRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(entry.status, "sent");

    let notifications = NotificationRepo::list(
        &pool,
        &merx_db::models::notification::NotificationListParams {
            recipient: "owner@example.com".to_string(),
            unread_only: None,
            limit: None,
            offset: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].title, "Application approved");
    assert!(!notifications[0].is_read);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unconfigured_email_channel_fails_the_attempt(pool: PgPool) {
    let payload = serde_json::json!({
        "channel": "email",
        "subject": "Hello",
        "html": "<p>Hello</p>",
    });
    let id = OutboxRepo::enqueue(
        &pool,
        &NewOutboxEntry {
            channel: "email",
            recipient: "owner@example.com",
            payload: &payload,
            trigger_key: None,
            template_id: None,
            not_before: Utc::now() - Duration::seconds(1),
            attempts_remaining: 1,
        },
    )
    .await
    .unwrap();

    let worker = OutboxWorker::new(pool.clone(), offline_senders());
    worker.process_due(Utc::now()).await.unwrap();

    let entry = OutboxRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(entry.status, "failed");
    assert!(entry
        .last_error
        .as_deref()
        .is_some_and(|e| e.contains("not configured")));
}
