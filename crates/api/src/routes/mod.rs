pub mod action_template;
pub mod health;
pub mod trigger;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /action-templates                       list, create
/// /action-templates/{id}                  get, update, delete
/// /action-templates/{id}/duplicate        duplicate (POST)
/// /action-templates/{id}/preview          render preview (POST)
/// /action-templates/{id}/test-send        enqueue test send (POST)
///
/// /triggers                               list, create
/// /triggers/{id}                          get, update, delete
/// /triggers/{id}/actions                  list, create (ordered links)
/// /trigger-actions/{id}                   update, delete
///
/// /dispatch/{trigger_key}                 fire trigger (POST)
///
/// /activity                               dispatch log (GET)
///
/// /preferences/{recipient}                get, update opt-outs
///
/// /notifications                          list (?recipient=)
/// /notifications/{id}/read                mark read (POST)
///
/// /api-keys                               list, create
///
/// /integration/dispatch/{trigger_key}     fire trigger (POST, X-Api-Key)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/action-templates", action_template::router())
        .merge(trigger::router())
        .route("/dispatch/{trigger_key}", post(handlers::dispatch::fire_trigger))
        .route("/activity", get(handlers::activity::list_activity))
        .route(
            "/preferences/{recipient}",
            get(handlers::preference::get_preference).put(handlers::preference::update_preference),
        )
        .route(
            "/notifications",
            get(handlers::notification::list_notifications),
        )
        .route(
            "/notifications/{id}/read",
            post(handlers::notification::mark_read),
        )
        .route(
            "/api-keys",
            get(handlers::api_key::list_api_keys).post(handlers::api_key::create_api_key),
        )
        .route(
            "/integration/dispatch/{trigger_key}",
            post(handlers::dispatch::integration_fire_trigger),
        )
}
