//! Standalone delivery worker.
//!
//! Runs the outbox worker and signature sweep outside the API process for
//! deployments that separate web and delivery. Outbox claiming makes it
//! safe to run any number of these alongside the server.

use std::time::Duration;

use merx_events::{OutboxWorker, Senders, SignatureSweep};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "merx_worker=debug,merx_events=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = merx_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    merx_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    let cancel = tokio_util::sync::CancellationToken::new();

    let outbox = OutboxWorker::new(pool.clone(), Senders::from_env());
    let outbox_cancel = cancel.clone();
    let outbox_handle = tokio::spawn(async move {
        outbox.run(outbox_cancel).await;
    });

    let sweep = SignatureSweep::new(pool);
    let sweep_cancel = cancel.clone();
    let sweep_handle = tokio::spawn(async move {
        sweep.run(sweep_cancel).await;
    });

    tracing::info!("Worker started (outbox delivery, signature sweep)");

    shutdown_signal().await;

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), outbox_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), sweep_handle).await;
    tracing::info!("Worker shut down");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
