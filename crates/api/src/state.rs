use std::sync::Arc;

use merx_events::TriggerDispatcher;

use crate::config::ServerConfig;
use crate::middleware::api_key::RateLimiter;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: merx_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Trigger dispatcher used by the dispatch and test-send endpoints.
    pub dispatcher: TriggerDispatcher,
    /// In-memory hour-bucketed rate limiter for integration endpoints.
    pub rate_limiter: Arc<RateLimiter>,
}
