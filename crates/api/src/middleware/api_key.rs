//! API key authentication and rate limiting for integration endpoints.
//!
//! Integration callers authenticate with an `X-Api-Key` header. The key is
//! looked up by SHA-256 hash, then checked against an in-memory
//! hour-bucketed counter keyed by (key id, hour). The counter is
//! process-local: counts reset on restart and are not shared across server
//! instances.

use std::collections::HashMap;
use std::sync::Mutex;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;
use merx_core::api_keys::{hash_api_key, INTEGRATION_RATE_LIMIT_PER_HOUR};
use merx_core::error::CoreError;
use merx_core::types::{DbId, Timestamp};
use merx_db::repositories::ApiKeyRepo;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the integration API key.
pub const API_KEY_HEADER: &str = "x-api-key";

// ---------------------------------------------------------------------------
// RateLimiter
// ---------------------------------------------------------------------------

/// In-memory hour-bucketed request counter.
pub struct RateLimiter {
    buckets: Mutex<HashMap<(DbId, i64), u32>>,
    limit: u32,
}

impl RateLimiter {
    /// Create a limiter allowing `limit` requests per key per clock hour.
    pub fn new(limit: u32) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            limit,
        }
    }

    /// Count one request for `key_id` at `now`.
    ///
    /// Returns `false` when the key's bucket for the current hour is
    /// exhausted. Stale buckets are pruned on every call so the map never
    /// outgrows the set of keys active this hour.
    pub fn check(&self, key_id: DbId, now: Timestamp) -> bool {
        let hour = now.timestamp() / 3_600;
        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");

        buckets.retain(|(_, bucket_hour), _| *bucket_hour == hour);

        let count = buckets.entry((key_id, hour)).or_insert(0);
        if *count >= self.limit {
            return false;
        }
        *count += 1;
        true
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(INTEGRATION_RATE_LIMIT_PER_HOUR)
    }
}

// ---------------------------------------------------------------------------
// ApiKeyAuth extractor
// ---------------------------------------------------------------------------

/// Extractor authenticating a request by its `X-Api-Key` header.
///
/// Resolves the active key row, applies the rate limit, and stamps
/// `last_used_at`.
pub struct ApiKeyAuth {
    pub key_id: DbId,
    pub key_name: String,
}

impl FromRequestParts<AppState> for ApiKeyAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Missing X-Api-Key header".into()))
            })?;

        let key = ApiKeyRepo::find_active_by_hash(&state.pool, &hash_api_key(provided))
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Unknown or inactive API key".into()))
            })?;

        if !state.rate_limiter.check(key.id, Utc::now()) {
            tracing::warn!(key_id = key.id, "API key rate limit exceeded");
            return Err(AppError::RateLimited);
        }

        ApiKeyRepo::touch_last_used(&state.pool, key.id).await?;

        Ok(ApiKeyAuth {
            key_id: key.id,
            key_name: key.name,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn allows_up_to_limit_then_blocks() {
        let limiter = RateLimiter::new(3);
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 10, 15, 0).unwrap();

        assert!(limiter.check(1, now));
        assert!(limiter.check(1, now));
        assert!(limiter.check(1, now));
        assert!(!limiter.check(1, now));
    }

    #[test]
    fn buckets_are_per_key() {
        let limiter = RateLimiter::new(1);
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 10, 15, 0).unwrap();

        assert!(limiter.check(1, now));
        assert!(limiter.check(2, now));
        assert!(!limiter.check(1, now));
    }

    #[test]
    fn counter_resets_on_the_next_hour() {
        let limiter = RateLimiter::new(1);
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 10, 59, 0).unwrap();

        assert!(limiter.check(1, now));
        assert!(!limiter.check(1, now));
        assert!(limiter.check(1, now + Duration::minutes(2)));
    }
}
