//! Handlers for recipient contact preferences.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use merx_db::models::preference::UpdateContactPreference;
use merx_db::repositories::ContactPreferenceRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/preferences/{recipient}
///
/// A recipient without a stored row is opted in everywhere; that is
/// reported as `data: null` rather than a 404.
pub async fn get_preference(
    State(state): State<AppState>,
    Path(recipient): Path<String>,
) -> AppResult<impl IntoResponse> {
    let preference = ContactPreferenceRepo::find_by_recipient(&state.pool, &recipient).await?;

    Ok(Json(DataResponse { data: preference }))
}

/// PUT /api/v1/preferences/{recipient}
///
/// Create or update the recipient's opt-out flags.
pub async fn update_preference(
    State(state): State<AppState>,
    Path(recipient): Path<String>,
    Json(input): Json<UpdateContactPreference>,
) -> AppResult<impl IntoResponse> {
    let preference = ContactPreferenceRepo::upsert(&state.pool, &recipient, &input).await?;

    tracing::info!(recipient = %recipient, "Contact preference updated");

    Ok(Json(DataResponse { data: preference }))
}
