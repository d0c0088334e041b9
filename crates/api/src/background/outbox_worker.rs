//! In-process outbox worker task.
//!
//! Runs [`merx_events::OutboxWorker`] alongside the API server for
//! deployments without a standalone worker process. Outbox claiming makes
//! it safe to run both at once.

use merx_db::DbPool;
use merx_events::{OutboxWorker, Senders};
use tokio_util::sync::CancellationToken;

/// Run the outbox delivery loop until `cancel` is triggered.
pub async fn run(pool: DbPool, cancel: CancellationToken) {
    let worker = OutboxWorker::new(pool, Senders::from_env());
    worker.run(cancel).await;
}
