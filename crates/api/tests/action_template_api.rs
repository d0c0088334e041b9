//! Integration tests for the action template endpoints: validation,
//! duplication, the preview renderer, and the in-use delete guard.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete, get, send_json};
use serde_json::json;
use sqlx::PgPool;

async fn create_template(app: axum::Router, body: serde_json::Value) -> serde_json::Value {
    let response = send_json(app, "POST", "/api/v1/action-templates", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

fn email_template_body() -> serde_json::Value {
    json!({
        "name": "Welcome Email",
        "action_type": "email",
        "config": {
            "subject": "Welcome {{owner_name}}",
            "html_content": "<p>Hello {{owner_name}}, welcome to {{company_name}}.</p>",
        },
        "variables": {
            "owner_name": "The signer's display name",
            "company_name": "Merchant business name",
        },
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_rejects_missing_channel_field_naming_it(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = send_json(
        app,
        "POST",
        "/api/v1/action-templates",
        json!({
            "name": "Broken",
            "action_type": "email",
            "config": {"html_content": "<p>no subject</p>"},
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(
        json["error"].as_str().unwrap().contains("config.subject"),
        "error must name the first invalid field: {}",
        json["error"]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_rejects_unknown_action_type(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = send_json(
        app,
        "POST",
        "/api/v1/action-templates",
        json!({
            "name": "Broken",
            "action_type": "pigeon",
            "config": {},
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("Unknown action type"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_webhook_url_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = send_json(
        app,
        "POST",
        "/api/v1/action-templates",
        json!({
            "name": "Hook",
            "action_type": "webhook",
            "config": {"url": "not-a-url", "method": "POST"},
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("config.url"));
}

// ---------------------------------------------------------------------------
// CRUD flows
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_get_update_round_trip(pool: PgPool) {
    let app = common::build_test_app(pool);

    let created = create_template(app.clone(), email_template_body()).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["version"], 1);

    let response = get(app.clone(), &format!("/api/v1/action-templates/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send_json(
        app.clone(),
        "PUT",
        &format!("/api/v1/action-templates/{id}"),
        json!({"name": "Welcome Email v2"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["data"]["name"], "Welcome Email v2");
    assert_eq!(updated["data"]["version"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_creates_inactive_copy(pool: PgPool) {
    let app = common::build_test_app(pool);

    let created = create_template(app.clone(), email_template_body()).await;
    let id = created["id"].as_i64().unwrap();

    let response = send_json(
        app.clone(),
        "POST",
        &format!("/api/v1/action-templates/{id}/duplicate"),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let copy = body_json(response).await;
    assert_eq!(copy["data"]["name"], "Welcome Email (Copy)");
    assert_eq!(copy["data"]["is_active"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_is_blocked_while_an_active_trigger_references_the_template(pool: PgPool) {
    let app = common::build_test_app(pool);

    let template = create_template(app.clone(), email_template_body()).await;
    let template_id = template["id"].as_i64().unwrap();

    let response = send_json(
        app.clone(),
        "POST",
        "/api/v1/triggers",
        json!({"trigger_key": "merchant_approved", "name": "Merchant approved"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let trigger = body_json(response).await;
    let trigger_id = trigger["data"]["id"].as_i64().unwrap();

    let response = send_json(
        app.clone(),
        "POST",
        &format!("/api/v1/triggers/{trigger_id}/actions"),
        json!({"template_id": template_id}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let action = body_json(response).await;
    let action_id = action["data"]["id"].as_i64().unwrap();

    // Deletion conflicts while the link is active, and the error names the
    // blocking trigger.
    let response = delete(app.clone(), &format!("/api/v1/action-templates/{template_id}")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFLICT");
    assert!(json["error"].as_str().unwrap().contains("Merchant approved"));

    // Deactivate the link, then deletion succeeds.
    let response = send_json(
        app.clone(),
        "PUT",
        &format!("/api/v1/trigger-actions/{action_id}"),
        json!({"is_active": false}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = delete(app.clone(), &format!("/api/v1/action-templates/{template_id}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn preview_reports_variables_and_renders_samples(pool: PgPool) {
    let app = common::build_test_app(pool);

    let template = create_template(app.clone(), email_template_body()).await;
    let id = template["id"].as_i64().unwrap();

    let response = send_json(
        app.clone(),
        "POST",
        &format!("/api/v1/action-templates/{id}/preview"),
        json!({"variables": {"owner_name": "Ada", "company_name": "Acme Foods"}}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let variables: Vec<&str> = json["data"]["variables"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(variables, vec!["company_name", "owner_name"]);
    assert_eq!(json["data"]["rendered"]["subject"], "Welcome Ada");

    // An unfilled sample leaves the token verbatim.
    let response = send_json(
        app.clone(),
        "POST",
        &format!("/api/v1/action-templates/{id}/preview"),
        json!({"variables": {"owner_name": "Ada"}}),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(
        json["data"]["rendered"]["html_content"],
        "<p>Hello Ada, welcome to {{company_name}}.</p>"
    );
}

// ---------------------------------------------------------------------------
// Test send
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_send_enqueues_one_outbox_entry(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    let template = create_template(app.clone(), email_template_body()).await;
    let id = template["id"].as_i64().unwrap();

    let response = send_json(
        app.clone(),
        "POST",
        &format!("/api/v1/action-templates/{id}/test-send"),
        json!({
            "recipient_email": "qa@example.com",
            "variables": {"owner_name": "QA", "company_name": "Test Co"},
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["channel"], "email");
    assert_eq!(json["data"]["recipient"], "qa@example.com");

    let outbox_id = json["data"]["outbox_id"].as_i64().unwrap();
    let entry = merx_db::repositories::OutboxRepo::find_by_id(&pool, outbox_id)
        .await
        .unwrap()
        .expect("outbox entry should exist");
    assert_eq!(entry.status, "pending");
    assert_eq!(entry.payload["subject"], "Welcome QA");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_send_without_recipient_is_a_bad_request(pool: PgPool) {
    let app = common::build_test_app(pool);

    let template = create_template(app.clone(), email_template_body()).await;
    let id = template["id"].as_i64().unwrap();

    let response = send_json(
        app.clone(),
        "POST",
        &format!("/api/v1/action-templates/{id}/test-send"),
        json!({"variables": {}}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
