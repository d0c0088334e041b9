//! Handlers for the `/action-templates` resource.
//!
//! Template configs are validated against their channel shape before any
//! write, so a rejected template is never partially persisted. Deletion is
//! guarded: a template referenced by an active trigger action reports a
//! conflict naming the blocking triggers instead of disappearing from
//! under them.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use merx_core::action_config::{validate_config, validate_variables};
use merx_core::channels::ActionType;
use merx_core::error::CoreError;
use merx_core::render::{extract_variables, render_template, VariableMap};
use merx_core::types::DbId;
use merx_db::models::action_template::{
    ActionTemplateListParams, CreateActionTemplate, UpdateActionTemplate,
};
use merx_db::models::outbox::NewOutboxEntry;
use merx_db::repositories::{ActionTemplateRepo, OutboxRepo};
use merx_events::context::{KEY_RECIPIENT_EMAIL, KEY_RECIPIENT_PHONE};
use merx_events::payload::render_action;
use merx_events::TriggerContext;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/action-templates
///
/// List templates with optional `action_type`, `category`, and
/// `active_only` filters.
pub async fn list_templates(
    State(state): State<AppState>,
    Query(params): Query<ActionTemplateListParams>,
) -> AppResult<impl IntoResponse> {
    let templates = ActionTemplateRepo::list(&state.pool, &params).await?;

    Ok(Json(DataResponse { data: templates }))
}

/// POST /api/v1/action-templates
///
/// Create a template after validating its channel config and variables.
pub async fn create_template(
    State(state): State<AppState>,
    Json(input): Json<CreateActionTemplate>,
) -> AppResult<impl IntoResponse> {
    let action_type: ActionType = input.action_type.parse().map_err(AppError::Core)?;
    validate_config(action_type, &input.config).map_err(AppError::Core)?;
    if let Some(variables) = &input.variables {
        validate_variables(variables).map_err(AppError::Core)?;
    }

    let template = ActionTemplateRepo::create(&state.pool, &input).await?;

    tracing::info!(template_id = template.id, name = %template.name, "Action template created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: template })))
}

/// GET /api/v1/action-templates/{id}
pub async fn get_template(
    State(state): State<AppState>,
    Path(template_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let template = ActionTemplateRepo::find_by_id(&state.pool, template_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ActionTemplate",
            id: template_id,
        }))?;

    Ok(Json(DataResponse { data: template }))
}

/// PUT /api/v1/action-templates/{id}
///
/// Partial update. A new `config` is validated against the template's
/// existing (immutable) action type.
pub async fn update_template(
    State(state): State<AppState>,
    Path(template_id): Path<DbId>,
    Json(input): Json<UpdateActionTemplate>,
) -> AppResult<impl IntoResponse> {
    let existing = ActionTemplateRepo::find_by_id(&state.pool, template_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ActionTemplate",
            id: template_id,
        }))?;

    if let Some(config) = &input.config {
        let action_type: ActionType = existing.action_type.parse().map_err(AppError::Core)?;
        validate_config(action_type, config).map_err(AppError::Core)?;
    }
    if let Some(variables) = &input.variables {
        validate_variables(variables).map_err(AppError::Core)?;
    }

    let template = ActionTemplateRepo::update(&state.pool, template_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ActionTemplate",
            id: template_id,
        }))?;

    Ok(Json(DataResponse { data: template }))
}

/// DELETE /api/v1/action-templates/{id}
///
/// Rejected with a 409 naming the blocking triggers while any active
/// trigger action still references the template.
pub async fn delete_template(
    State(state): State<AppState>,
    Path(template_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let blocking =
        ActionTemplateRepo::active_trigger_names_referencing(&state.pool, template_id).await?;
    if !blocking.is_empty() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Template is in use by active triggers: {}",
            blocking.join(", ")
        ))));
    }

    let deleted = ActionTemplateRepo::delete(&state.pool, template_id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "ActionTemplate",
            id: template_id,
        }));
    }

    tracing::info!(template_id, "Action template deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/action-templates/{id}/duplicate
///
/// Copy a template. The copy is named "<name> (Copy)" and created inactive
/// so it never fires until reviewed.
pub async fn duplicate_template(
    State(state): State<AppState>,
    Path(template_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let copy = ActionTemplateRepo::duplicate(&state.pool, template_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ActionTemplate",
            id: template_id,
        }))?;

    tracing::info!(template_id, copy_id = copy.id, "Action template duplicated");

    Ok((StatusCode::CREATED, Json(DataResponse { data: copy })))
}

// ---------------------------------------------------------------------------
// Preview and test send
// ---------------------------------------------------------------------------

/// Request body for the preview endpoint.
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    /// Sample values for `{{variable}}` substitution.
    #[serde(default)]
    pub variables: VariableMap,
}

/// POST /api/v1/action-templates/{id}/preview
///
/// Render every text field of the template's config against the supplied
/// sample values and report the variable names the template uses.
pub async fn preview_template(
    State(state): State<AppState>,
    Path(template_id): Path<DbId>,
    Json(input): Json<PreviewRequest>,
) -> AppResult<impl IntoResponse> {
    let template = ActionTemplateRepo::find_by_id(&state.pool, template_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ActionTemplate",
            id: template_id,
        }))?;

    let text_fields: Vec<(String, String)> = template
        .config
        .as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    let sources: Vec<&str> = text_fields.iter().map(|(_, v)| v.as_str()).collect();
    let variables: Vec<String> = extract_variables(&sources).into_iter().collect();

    let rendered: serde_json::Map<String, serde_json::Value> = text_fields
        .iter()
        .map(|(field, text)| {
            (
                field.clone(),
                serde_json::Value::String(render_template(text, &input.variables)),
            )
        })
        .collect();

    Ok(Json(DataResponse {
        data: serde_json::json!({
            "variables": variables,
            "rendered": rendered,
        }),
    }))
}

/// Request body for the test-send endpoint.
#[derive(Debug, Deserialize)]
pub struct TestSendRequest {
    pub recipient_email: Option<String>,
    pub recipient_phone: Option<String>,
    /// Sample values for `{{variable}}` substitution.
    #[serde(default)]
    pub variables: VariableMap,
}

/// POST /api/v1/action-templates/{id}/test-send
///
/// Render the template against sample values and enqueue one immediate
/// delivery to the supplied recipient.
pub async fn test_send_template(
    State(state): State<AppState>,
    Path(template_id): Path<DbId>,
    Json(input): Json<TestSendRequest>,
) -> AppResult<impl IntoResponse> {
    let template = ActionTemplateRepo::find_by_id(&state.pool, template_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ActionTemplate",
            id: template_id,
        }))?;

    let mut context = TriggerContext::new();
    for (key, value) in &input.variables {
        context = context.with(key.clone(), value.clone());
    }
    if let Some(email) = &input.recipient_email {
        context = context.with(KEY_RECIPIENT_EMAIL, email.clone());
    }
    if let Some(phone) = &input.recipient_phone {
        context = context.with(KEY_RECIPIENT_PHONE, phone.clone());
    }

    let (recipient, payload) =
        render_action(&template, &context).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let payload_json = serde_json::to_value(&payload)
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    let outbox_id = OutboxRepo::enqueue(
        &state.pool,
        &NewOutboxEntry {
            channel: payload.channel(),
            recipient: &recipient,
            payload: &payload_json,
            trigger_key: None,
            template_id: Some(template.id),
            not_before: chrono::Utc::now(),
            attempts_remaining: 1,
        },
    )
    .await?;

    tracing::info!(template_id, outbox_id, recipient = %recipient, "Test send enqueued");

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: serde_json::json!({
                "outbox_id": outbox_id,
                "channel": payload.channel(),
                "recipient": recipient,
            }),
        }),
    ))
}
