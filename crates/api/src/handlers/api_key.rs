//! Handlers for integration API key management.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use merx_core::api_keys::generate_api_key;
use merx_core::error::CoreError;
use merx_db::models::api_key::CreateApiKey;
use merx_db::repositories::ApiKeyRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/api-keys
///
/// List keys (prefix and metadata only; hashes are never serialized).
pub async fn list_api_keys(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let keys = ApiKeyRepo::list(&state.pool).await?;

    Ok(Json(DataResponse { data: keys }))
}

/// POST /api/v1/api-keys
///
/// Generate a key. The plaintext is returned exactly once and never stored.
pub async fn create_api_key(
    State(state): State<AppState>,
    Json(input): Json<CreateApiKey>,
) -> AppResult<impl IntoResponse> {
    if input.name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "name must not be empty".into(),
        )));
    }

    let generated = generate_api_key();
    let key = ApiKeyRepo::create(&state.pool, &input.name, &generated.prefix, &generated.hash)
        .await?;

    tracing::info!(key_id = key.id, name = %key.name, "API key created");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: serde_json::json!({
                "api_key": key,
                "plaintext": generated.plaintext,
            }),
        }),
    ))
}
