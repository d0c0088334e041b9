//! Route definitions for the `/action-templates` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::action_template;
use crate::state::AppState;

/// Routes mounted at `/action-templates`.
///
/// ```text
/// GET    /                 -> list_templates
/// POST   /                 -> create_template
/// GET    /{id}             -> get_template
/// PUT    /{id}             -> update_template
/// DELETE /{id}             -> delete_template
/// POST   /{id}/duplicate   -> duplicate_template
/// POST   /{id}/preview     -> preview_template
/// POST   /{id}/test-send   -> test_send_template
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(action_template::list_templates).post(action_template::create_template),
        )
        .route(
            "/{id}",
            get(action_template::get_template)
                .put(action_template::update_template)
                .delete(action_template::delete_template),
        )
        .route("/{id}/duplicate", post(action_template::duplicate_template))
        .route("/{id}/preview", post(action_template::preview_template))
        .route("/{id}/test-send", post(action_template::test_send_template))
}
