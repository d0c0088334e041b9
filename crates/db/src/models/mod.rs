//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod action_template;
pub mod activity;
pub mod api_key;
pub mod notification;
pub mod outbox;
pub mod preference;
pub mod prospect;
pub mod signature_capture;
pub mod trigger;
