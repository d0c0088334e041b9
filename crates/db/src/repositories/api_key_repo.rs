//! Repository for the `api_keys` table.

use merx_core::types::DbId;
use sqlx::PgPool;

use crate::models::api_key::ApiKey;

const COLUMNS: &str = "id, name, key_prefix, key_hash, is_active, created_at, last_used_at";

/// Provides CRUD operations for integration API keys.
pub struct ApiKeyRepo;

impl ApiKeyRepo {
    /// Store a newly generated key (prefix + hash only, never plaintext).
    pub async fn create(
        pool: &PgPool,
        name: &str,
        key_prefix: &str,
        key_hash: &str,
    ) -> Result<ApiKey, sqlx::Error> {
        let query = format!(
            "INSERT INTO api_keys (name, key_prefix, key_hash) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ApiKey>(&query)
            .bind(name)
            .bind(key_prefix)
            .bind(key_hash)
            .fetch_one(pool)
            .await
    }

    /// Look up an active key by the SHA-256 hash of its plaintext.
    pub async fn find_active_by_hash(
        pool: &PgPool,
        key_hash: &str,
    ) -> Result<Option<ApiKey>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM api_keys WHERE key_hash = $1 AND is_active = true");
        sqlx::query_as::<_, ApiKey>(&query)
            .bind(key_hash)
            .fetch_optional(pool)
            .await
    }

    /// List all keys, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<ApiKey>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM api_keys ORDER BY created_at DESC");
        sqlx::query_as::<_, ApiKey>(&query).fetch_all(pool).await
    }

    /// Record that a key was used for authentication.
    pub async fn touch_last_used(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE api_keys SET last_used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
