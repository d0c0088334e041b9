//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod action_template_repo;
pub mod activity_repo;
pub mod api_key_repo;
pub mod notification_repo;
pub mod outbox_repo;
pub mod preference_repo;
pub mod prospect_repo;
pub mod signature_capture_repo;
pub mod trigger_action_repo;
pub mod trigger_catalog_repo;

pub use action_template_repo::ActionTemplateRepo;
pub use activity_repo::ActivityRepo;
pub use api_key_repo::ApiKeyRepo;
pub use notification_repo::NotificationRepo;
pub use outbox_repo::OutboxRepo;
pub use preference_repo::ContactPreferenceRepo;
pub use prospect_repo::ProspectRepo;
pub use signature_capture_repo::SignatureCaptureRepo;
pub use trigger_action_repo::TriggerActionRepo;
pub use trigger_catalog_repo::TriggerCatalogRepo;
