//! Signature capture model: a pending e-signature request tracked by the
//! expiration sweep.

use merx_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Signature request is awaiting the signer.
pub const STATUS_REQUESTED: &str = "requested";

/// Signature request was completed by the signer.
pub const STATUS_COMPLETED: &str = "completed";

/// Signature request passed its expiry window without completion.
pub const STATUS_EXPIRED: &str = "expired";

/// A row from the `signature_captures` table.
///
/// The reminder flags replace the legacy free-text "reminder sent" markers
/// that used to live in `notes`; `notes` remains an append-only human audit
/// trail.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SignatureCapture {
    pub id: DbId,
    pub prospect_id: Option<DbId>,
    pub role_key: String,
    pub signer_name: Option<String>,
    pub signer_email: String,
    pub status: String,
    pub notes: Option<String>,
    pub reminder_3day_sent_at: Option<Timestamp>,
    pub reminder_1day_sent_at: Option<Timestamp>,
    pub requested_at: Timestamp,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a signature request. `expires_at` defaults to seven
/// days after `requested_at` when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSignatureCapture {
    pub prospect_id: Option<DbId>,
    pub role_key: Option<String>,
    pub signer_name: Option<String>,
    pub signer_email: String,
    pub expires_at: Option<Timestamp>,
}
