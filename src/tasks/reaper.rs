//! Periodic sweep that deletes poison messages from every queue.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use crate::queue::QueueEngine;

/// Background task that purges poison messages from every queue
pub struct ReaperTask {
    engine: Arc<QueueEngine>,
    interval: Duration,
    shutdown: broadcast::Receiver<()>,
}

impl ReaperTask {
    pub fn new(
        engine: Arc<QueueEngine>,
        interval: Duration,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            engine,
            interval,
            shutdown,
        }
    }

    /// Run the reaper until shutdown is signalled
    pub async fn run(mut self) {
        let mut timer = tokio::time::interval(self.interval);

        // Skip immediate first tick
        timer.tick().await;

        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            poison_threshold = self.engine.config().poison_threshold,
            "Reaper task started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("Reaper task received shutdown signal");
                    break;
                }
                _ = timer.tick() => {
                    self.sweep().await;
                }
            }
        }

        tracing::info!("Reaper task stopped");
    }

    /// Delete poison messages once
    async fn sweep(&self) {
        let start = Instant::now();

        match self.engine.reap_poisoned().await {
            Ok(0) => {
                tracing::trace!("Reaper found no poison messages");
            }
            Ok(removed) => {
                tracing::info!(
                    removed = removed,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Reaped poison messages"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to reap poison messages");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::queue::{store, QueueConfig};
    use crate::sqlite::SqliteDatabase;

    async fn create_test_engine(poison_threshold: i64) -> Arc<QueueEngine> {
        let db = SqliteDatabase::connect(&DatabaseConfig::in_memory())
            .await
            .unwrap();
        let config = QueueConfig {
            poison_threshold,
            ..Default::default()
        };
        Arc::new(QueueEngine::open(db.pool().clone(), config).await.unwrap())
    }

    #[tokio::test]
    async fn test_reaper_task_shutdown() {
        let engine = create_test_engine(4).await;
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = ReaperTask::new(engine, Duration::from_secs(60), shutdown_rx);

        // Spawn the task
        let handle = tokio::spawn(async move {
            task.run().await;
        });

        // Wait a bit then send shutdown
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.send(()).unwrap();

        // Task should complete
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("Task should complete")
            .expect("Task should not panic");
    }

    #[tokio::test]
    async fn test_reaper_removes_poison_messages() {
        let engine = create_test_engine(1).await;
        engine.enqueue("orders", "poison", 0).await.unwrap();
        engine.enqueue("orders", "healthy", 0).await.unwrap();
        engine.enqueue("other", "untouched", 0).await.unwrap();

        // Push "poison" past the threshold without consuming it
        let now = store::now_secs();
        let rows: Vec<i64> = sqlx::query_scalar("SELECT id FROM messages WHERE message = 'poison'")
            .fetch_all(engine.pool())
            .await
            .unwrap();
        for token in ["t1", "t2"] {
            store::mark_received(engine.pool(), rows[0], now + 600, token)
                .await
                .unwrap();
        }

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = ReaperTask::new(engine.clone(), Duration::from_millis(100), shutdown_rx);
        let handle = tokio::spawn(async move {
            task.run().await;
        });

        tokio::time::sleep(Duration::from_millis(350)).await;
        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();

        // Only the hidden poison row is gone
        assert!(!engine.delete("t2").await.unwrap());
        assert_eq!(engine.purge_queue("orders").await.unwrap(), 1);
        assert_eq!(engine.queue_length("other").await.unwrap(), 1);
    }
}
