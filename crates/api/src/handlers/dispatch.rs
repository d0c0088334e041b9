//! Handlers firing triggers over HTTP.
//!
//! Two surfaces share the same dispatch path: an admin test-fire endpoint
//! and an API-key-authenticated integration endpoint for external systems.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use merx_events::TriggerContext;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::api_key::ApiKeyAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for firing a trigger.
#[derive(Debug, Default, Deserialize)]
pub struct FireRequest {
    /// Key/value context for `{{variable}}` rendering and recipient
    /// addressing (`recipient_email`, `recipient_phone`).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

fn build_context(input: FireRequest) -> TriggerContext {
    let mut context = TriggerContext::new();
    for (key, value) in input.context {
        context = context.with(key, value);
    }
    context
}

/// POST /api/v1/dispatch/{trigger_key}
///
/// Fire a trigger and report what the dispatcher did. Firing an unknown or
/// inactive key is not an error — it reports zero actions.
pub async fn fire_trigger(
    State(state): State<AppState>,
    Path(trigger_key): Path<String>,
    Json(input): Json<FireRequest>,
) -> AppResult<impl IntoResponse> {
    let context = build_context(input);
    let summary = state.dispatcher.dispatch(&trigger_key, &context).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: serde_json::json!({
                "trigger_key": trigger_key,
                "enqueued": summary.enqueued,
                "skipped": summary.skipped,
                "failed": summary.failed,
            }),
        }),
    ))
}

/// POST /api/v1/integration/dispatch/{trigger_key}
///
/// Same dispatch path, authenticated by `X-Api-Key` and rate limited per
/// key per hour.
pub async fn integration_fire_trigger(
    auth: ApiKeyAuth,
    State(state): State<AppState>,
    Path(trigger_key): Path<String>,
    Json(input): Json<FireRequest>,
) -> AppResult<impl IntoResponse> {
    let context = build_context(input);
    let summary = state.dispatcher.dispatch(&trigger_key, &context).await?;

    tracing::info!(
        api_key = %auth.key_name,
        trigger_key,
        enqueued = summary.enqueued,
        "Integration dispatch"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: serde_json::json!({
                "trigger_key": trigger_key,
                "enqueued": summary.enqueued,
                "skipped": summary.skipped,
                "failed": summary.failed,
            }),
        }),
    ))
}
