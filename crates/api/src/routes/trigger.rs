//! Route definitions for the `/triggers` resource and its action links.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::trigger;
use crate::state::AppState;

/// Routes mounted at `/triggers` and `/trigger-actions`.
///
/// ```text
/// GET    /triggers                  -> list_triggers
/// POST   /triggers                  -> create_trigger
/// GET    /triggers/{id}             -> get_trigger
/// PUT    /triggers/{id}             -> update_trigger
/// DELETE /triggers/{id}             -> delete_trigger
/// GET    /triggers/{id}/actions     -> list_trigger_actions
/// POST   /triggers/{id}/actions     -> create_trigger_action
/// PUT    /trigger-actions/{id}      -> update_trigger_action
/// DELETE /trigger-actions/{id}      -> delete_trigger_action
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/triggers",
            get(trigger::list_triggers).post(trigger::create_trigger),
        )
        .route(
            "/triggers/{id}",
            get(trigger::get_trigger)
                .put(trigger::update_trigger)
                .delete(trigger::delete_trigger),
        )
        .route(
            "/triggers/{id}/actions",
            get(trigger::list_trigger_actions).post(trigger::create_trigger_action),
        )
        .route(
            "/trigger-actions/{id}",
            put(trigger::update_trigger_action).delete(trigger::delete_trigger_action),
        )
}
