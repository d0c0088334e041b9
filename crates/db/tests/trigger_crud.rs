//! Integration tests for trigger catalog and trigger action repositories.

use merx_db::models::action_template::CreateActionTemplate;
use merx_db::models::trigger::{CreateTrigger, CreateTriggerAction, UpdateTriggerAction};
use merx_db::repositories::{ActionTemplateRepo, TriggerActionRepo, TriggerCatalogRepo};
use sqlx::PgPool;

fn trigger_input(key: &str) -> CreateTrigger {
    CreateTrigger {
        trigger_key: key.to_string(),
        name: format!("Trigger {key}"),
        description: None,
        category: Some("test".to_string()),
        is_active: None,
    }
}

fn email_template_input(name: &str) -> CreateActionTemplate {
    CreateActionTemplate {
        name: name.to_string(),
        description: None,
        action_type: "email".to_string(),
        category: None,
        config: serde_json::json!({
            "subject": "Hello {{owner_name}}",
            "html_content": "<p>Hi</p>",
        }),
        variables: None,
        is_active: None,
    }
}

fn action_input(template_id: i64, sequence_order: Option<i32>) -> CreateTriggerAction {
    CreateTriggerAction {
        template_id,
        sequence_order,
        delay_seconds: None,
        requires_email_preference: None,
        requires_sms_preference: None,
        retry_on_failure: None,
        max_retries: None,
        is_active: None,
    }
}

// ---------------------------------------------------------------------------
// Trigger catalog
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_trigger_key_is_rejected(pool: PgPool) {
    TriggerCatalogRepo::create(&pool, &trigger_input("merchant_approved"))
        .await
        .unwrap();

    let err = TriggerCatalogRepo::create(&pool, &trigger_input("merchant_approved"))
        .await
        .unwrap_err();

    // Unique constraint names are prefixed uq_ so the API maps them to 409.
    match err {
        sqlx::Error::Database(db_err) => {
            assert_eq!(db_err.constraint(), Some("uq_trigger_catalog_key"));
        }
        other => panic!("expected database error, got {other:?}"),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn inactive_trigger_is_invisible_to_key_lookup(pool: PgPool) {
    let trigger = TriggerCatalogRepo::create(&pool, &trigger_input("merchant_approved"))
        .await
        .unwrap();

    let found = TriggerCatalogRepo::find_active_by_key(&pool, "merchant_approved")
        .await
        .unwrap();
    assert!(found.is_some());

    TriggerCatalogRepo::update(
        &pool,
        trigger.id,
        &merx_db::models::trigger::UpdateTrigger {
            name: None,
            description: None,
            category: None,
            is_active: Some(false),
        },
    )
    .await
    .unwrap();

    let found = TriggerCatalogRepo::find_active_by_key(&pool, "merchant_approved")
        .await
        .unwrap();
    assert!(found.is_none());
}

// ---------------------------------------------------------------------------
// Trigger actions: sequence ordering
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn sequence_order_defaults_to_max_plus_one(pool: PgPool) {
    let trigger = TriggerCatalogRepo::create(&pool, &trigger_input("merchant_approved"))
        .await
        .unwrap();
    let template = ActionTemplateRepo::create(&pool, &email_template_input("Welcome"))
        .await
        .unwrap();

    let first = TriggerActionRepo::create(&pool, trigger.id, &action_input(template.id, None))
        .await
        .unwrap();
    assert_eq!(first.sequence_order, 1);

    let second = TriggerActionRepo::create(&pool, trigger.id, &action_input(template.id, None))
        .await
        .unwrap();
    assert_eq!(second.sequence_order, 2);

    // An explicit order is taken verbatim, and the next default continues
    // from the new maximum.
    let jumped =
        TriggerActionRepo::create(&pool, trigger.id, &action_input(template.id, Some(10)))
            .await
            .unwrap();
    assert_eq!(jumped.sequence_order, 10);

    let next = TriggerActionRepo::create(&pool, trigger.id, &action_input(template.id, None))
        .await
        .unwrap();
    assert_eq!(next.sequence_order, 11);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn listing_tolerates_duplicate_sequence_orders(pool: PgPool) {
    let trigger = TriggerCatalogRepo::create(&pool, &trigger_input("merchant_approved"))
        .await
        .unwrap();
    let template = ActionTemplateRepo::create(&pool, &email_template_input("Welcome"))
        .await
        .unwrap();

    // Duplicates are allowed: sequence_order is a sort key, not an identity.
    let a = TriggerActionRepo::create(&pool, trigger.id, &action_input(template.id, Some(5)))
        .await
        .unwrap();
    let b = TriggerActionRepo::create(&pool, trigger.id, &action_input(template.id, Some(5)))
        .await
        .unwrap();
    let c = TriggerActionRepo::create(&pool, trigger.id, &action_input(template.id, Some(1)))
        .await
        .unwrap();

    let listed = TriggerActionRepo::list_for_trigger(&pool, trigger.id)
        .await
        .unwrap();
    let ids: Vec<i64> = listed.iter().map(|action| action.id).collect();

    // Ordered by sequence_order, ties broken by insertion (id).
    assert_eq!(ids, vec![c.id, a.id, b.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_trigger_cascades_links_but_not_templates(pool: PgPool) {
    let trigger = TriggerCatalogRepo::create(&pool, &trigger_input("merchant_approved"))
        .await
        .unwrap();
    let template = ActionTemplateRepo::create(&pool, &email_template_input("Welcome"))
        .await
        .unwrap();
    let action = TriggerActionRepo::create(&pool, trigger.id, &action_input(template.id, None))
        .await
        .unwrap();

    assert!(TriggerCatalogRepo::delete(&pool, trigger.id).await.unwrap());

    assert!(TriggerActionRepo::find_by_id(&pool, action.id)
        .await
        .unwrap()
        .is_none());
    assert!(ActionTemplateRepo::find_by_id(&pool, template.id)
        .await
        .unwrap()
        .is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deactivated_links_are_excluded_from_dispatch_listing(pool: PgPool) {
    let trigger = TriggerCatalogRepo::create(&pool, &trigger_input("merchant_approved"))
        .await
        .unwrap();
    let template = ActionTemplateRepo::create(&pool, &email_template_input("Welcome"))
        .await
        .unwrap();

    let keep = TriggerActionRepo::create(&pool, trigger.id, &action_input(template.id, None))
        .await
        .unwrap();
    let drop = TriggerActionRepo::create(&pool, trigger.id, &action_input(template.id, None))
        .await
        .unwrap();

    TriggerActionRepo::update(
        &pool,
        drop.id,
        &UpdateTriggerAction {
            sequence_order: None,
            delay_seconds: None,
            requires_email_preference: None,
            requires_sms_preference: None,
            retry_on_failure: None,
            max_retries: None,
            is_active: Some(false),
        },
    )
    .await
    .unwrap();

    let active = TriggerActionRepo::list_active_for_trigger(&pool, trigger.id)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, keep.id);

    let all = TriggerActionRepo::list_for_trigger(&pool, trigger.id)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}
