use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;

use suqs::config::Settings;
use suqs::queue::{QueueConfig, QueueEngine};
use suqs::server::{create_app, AppState};
use suqs::sqlite::SqliteDatabase;
use suqs::tasks::ReaperTask;
use suqs::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing
    init_tracing(&settings.log)?;
    tracing::info!("Configuration loaded");

    // Open the durable store and the engine over it
    let database = SqliteDatabase::connect(&settings.database).await?;
    let engine = Arc::new(
        QueueEngine::open(database.pool().clone(), QueueConfig::from(&settings.queue)).await?,
    );

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Start poison reaper in background
    let reaper_task = ReaperTask::new(
        engine.clone(),
        Duration::from_secs(settings.queue.reaper_interval_seconds.max(1)),
        shutdown_tx.subscribe(),
    );
    let reaper_handle = tokio::spawn(async move {
        reaper_task.run().await;
    });

    // Create Axum app
    let state = AppState::new(settings.clone(), database.clone(), engine);
    let app = create_app(state);
    tracing::info!("Application state initialized");

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler(shutdown_tx))
        .await?;

    // Wait for background tasks to finish
    tracing::info!("Waiting for background tasks to finish...");
    if let Err(e) = reaper_handle.await {
        tracing::error!(error = %e, "Reaper task ended abnormally");
    }

    database.close().await;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal_handler(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }

    // Stop the reaper
    let _ = shutdown_tx.send(());
}
