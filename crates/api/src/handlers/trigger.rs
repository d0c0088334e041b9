//! Handlers for the `/triggers` resource and its ordered action links.

use std::sync::LazyLock;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use merx_core::error::CoreError;
use merx_core::types::DbId;
use merx_db::models::trigger::{
    CreateTrigger, CreateTriggerAction, UpdateTrigger, UpdateTriggerAction,
};
use merx_db::repositories::{ActionTemplateRepo, TriggerActionRepo, TriggerCatalogRepo};
use regex::Regex;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Trigger keys are stable snake_case identifiers referenced from code.
const TRIGGER_KEY_PATTERN: &str = r"^[a-z][a-z0-9_]*$";

static TRIGGER_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TRIGGER_KEY_PATTERN).expect("valid regex"));

// ---------------------------------------------------------------------------
// Trigger catalog CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/triggers
pub async fn list_triggers(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let triggers = TriggerCatalogRepo::list(&state.pool).await?;

    Ok(Json(DataResponse { data: triggers }))
}

/// POST /api/v1/triggers
///
/// Create a catalog entry. The `trigger_key` is write-once and must be a
/// snake_case identifier.
pub async fn create_trigger(
    State(state): State<AppState>,
    Json(input): Json<CreateTrigger>,
) -> AppResult<impl IntoResponse> {
    if !TRIGGER_KEY_RE.is_match(&input.trigger_key) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "trigger_key must match {TRIGGER_KEY_PATTERN}"
        ))));
    }
    if input.name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "name must not be empty".into(),
        )));
    }

    let trigger = TriggerCatalogRepo::create(&state.pool, &input).await?;

    tracing::info!(trigger_id = trigger.id, trigger_key = %trigger.trigger_key, "Trigger created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: trigger })))
}

/// GET /api/v1/triggers/{id}
pub async fn get_trigger(
    State(state): State<AppState>,
    Path(trigger_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let trigger = TriggerCatalogRepo::find_by_id(&state.pool, trigger_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Trigger",
            id: trigger_id,
        }))?;

    Ok(Json(DataResponse { data: trigger }))
}

/// PUT /api/v1/triggers/{id}
///
/// Update name/description/category/active flag. The key never changes.
pub async fn update_trigger(
    State(state): State<AppState>,
    Path(trigger_id): Path<DbId>,
    Json(input): Json<UpdateTrigger>,
) -> AppResult<impl IntoResponse> {
    let trigger = TriggerCatalogRepo::update(&state.pool, trigger_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Trigger",
            id: trigger_id,
        }))?;

    Ok(Json(DataResponse { data: trigger }))
}

/// DELETE /api/v1/triggers/{id}
///
/// Removes the trigger and cascades its action links. Linked templates are
/// untouched.
pub async fn delete_trigger(
    State(state): State<AppState>,
    Path(trigger_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = TriggerCatalogRepo::delete(&state.pool, trigger_id).await?;

    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Trigger",
            id: trigger_id,
        }));
    }

    tracing::info!(trigger_id, "Trigger deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Trigger actions
// ---------------------------------------------------------------------------

/// GET /api/v1/triggers/{id}/actions
///
/// List the trigger's links in execution order
/// (`sequence_order ASC, id ASC`).
pub async fn list_trigger_actions(
    State(state): State<AppState>,
    Path(trigger_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    TriggerCatalogRepo::find_by_id(&state.pool, trigger_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Trigger",
            id: trigger_id,
        }))?;

    let actions = TriggerActionRepo::list_for_trigger(&state.pool, trigger_id).await?;

    Ok(Json(DataResponse { data: actions }))
}

/// POST /api/v1/triggers/{id}/actions
///
/// Link a template beneath the trigger. Without an explicit
/// `sequence_order` the link lands at the end of the list.
pub async fn create_trigger_action(
    State(state): State<AppState>,
    Path(trigger_id): Path<DbId>,
    Json(input): Json<CreateTriggerAction>,
) -> AppResult<impl IntoResponse> {
    TriggerCatalogRepo::find_by_id(&state.pool, trigger_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Trigger",
            id: trigger_id,
        }))?;

    ActionTemplateRepo::find_by_id(&state.pool, input.template_id)
        .await?
        .ok_or(AppError::Core(CoreError::Validation(format!(
            "template_id {} does not exist",
            input.template_id
        ))))?;

    if input.max_retries.is_some_and(|n| n < 0) {
        return Err(AppError::Core(CoreError::Validation(
            "max_retries must not be negative".into(),
        )));
    }
    if input.delay_seconds.is_some_and(|n| n < 0) {
        return Err(AppError::Core(CoreError::Validation(
            "delay_seconds must not be negative".into(),
        )));
    }

    let action = TriggerActionRepo::create(&state.pool, trigger_id, &input).await?;

    tracing::info!(
        trigger_id,
        trigger_action_id = action.id,
        template_id = action.template_id,
        sequence_order = action.sequence_order,
        "Trigger action created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: action })))
}

/// PUT /api/v1/trigger-actions/{id}
pub async fn update_trigger_action(
    State(state): State<AppState>,
    Path(action_id): Path<DbId>,
    Json(input): Json<UpdateTriggerAction>,
) -> AppResult<impl IntoResponse> {
    if input.max_retries.is_some_and(|n| n < 0) {
        return Err(AppError::Core(CoreError::Validation(
            "max_retries must not be negative".into(),
        )));
    }
    if input.delay_seconds.is_some_and(|n| n < 0) {
        return Err(AppError::Core(CoreError::Validation(
            "delay_seconds must not be negative".into(),
        )));
    }

    let action = TriggerActionRepo::update(&state.pool, action_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "TriggerAction",
            id: action_id,
        }))?;

    Ok(Json(DataResponse { data: action }))
}

/// DELETE /api/v1/trigger-actions/{id}
pub async fn delete_trigger_action(
    State(state): State<AppState>,
    Path(action_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = TriggerActionRepo::delete(&state.pool, action_id).await?;

    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "TriggerAction",
            id: action_id,
        }));
    }

    Ok(StatusCode::NO_CONTENT)
}
