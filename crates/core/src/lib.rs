//! Merx domain core.
//!
//! Dependency-light building blocks shared by the database, event, and API
//! layers: common type aliases, the domain error enum, the `{{variable}}`
//! template renderer, per-channel action config validation, and API key
//! utilities.

pub mod action_config;
pub mod api_keys;
pub mod channels;
pub mod error;
pub mod render;
pub mod types;
