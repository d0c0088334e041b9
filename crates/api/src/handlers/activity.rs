//! Handlers for the `/activity` dispatch log view.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use merx_db::models::activity::ActivityListParams;
use merx_db::repositories::ActivityRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/activity
///
/// List dispatch log entries, newest first, with optional `channel`,
/// `status`, and `recipient` filters.
pub async fn list_activity(
    State(state): State<AppState>,
    Query(params): Query<ActivityListParams>,
) -> AppResult<impl IntoResponse> {
    let entries = ActivityRepo::list(&state.pool, &params).await?;

    Ok(Json(DataResponse { data: entries }))
}
