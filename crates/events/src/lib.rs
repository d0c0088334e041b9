//! Merx trigger dispatch and delivery infrastructure.
//!
//! This crate provides the core building blocks of the notification
//! engine:
//!
//! - [`TriggerContext`] — the key/value context a trigger is fired with.
//! - [`TriggerDispatcher`] — resolves a trigger key to its ordered action
//!   list, renders each template, and enqueues the results.
//! - [`OutboundPayload`] — a fully rendered, channel-typed payload.
//! - [`OutboxWorker`] — polls the durable outbox and owns delivery,
//!   retry, and backoff.
//! - [`delivery`] — thin per-channel sender adapters (SMTP, webhook,
//!   SMS gateway, Slack/Teams).
//! - [`SignatureSweep`] — periodic expiry/reminder scan over pending
//!   e-signature requests.

pub mod context;
pub mod delivery;
pub mod dispatcher;
pub mod outbox;
pub mod payload;
pub mod sweep;

pub use context::TriggerContext;
pub use delivery::Senders;
pub use dispatcher::TriggerDispatcher;
pub use outbox::OutboxWorker;
pub use payload::OutboundPayload;
pub use sweep::SignatureSweep;
