//! In-process signature sweep task.
//!
//! Runs [`merx_events::SignatureSweep`] on its 6-hour interval alongside
//! the API server.

use merx_db::DbPool;
use merx_events::SignatureSweep;
use tokio_util::sync::CancellationToken;

/// Run the signature expiry/reminder loop until `cancel` is triggered.
pub async fn run(pool: DbPool, cancel: CancellationToken) {
    let sweep = SignatureSweep::new(pool);
    sweep.run(cancel).await;
}
