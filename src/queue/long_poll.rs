//! Long-polling retrieval on top of the engine.
//!
//! The engine's `dequeue` returns immediately on an empty queue and may park
//! indefinitely after losing a race. `LongPoller` turns that into a bounded
//! wait: attempts run on a fixed cadence, each one giving up on its park at
//! the next tick, and the whole poll ends at the ceiling. The deadlines are
//! handed to the engine rather than enforced by dropping an attempt, so an
//! attempt that already holds the lock always finishes its delivery.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use crate::config::LongPollSettings;

use super::engine::QueueEngine;
use super::error::QueueError;
use super::models::DequeuedMessage;

/// Smallest poll interval a request may ask for, in seconds.
pub const MIN_POLL_INTERVAL_SECS: u64 = 1;

/// Largest poll interval a request may ask for, in seconds.
pub const MAX_POLL_INTERVAL_SECS: u64 = 5;

const MIN_TICK: Duration = Duration::from_millis(10);

pub struct LongPoller {
    engine: Arc<QueueEngine>,
    max_wait: Duration,
    default_interval: Duration,
}

impl LongPoller {
    pub fn new(engine: Arc<QueueEngine>, max_wait: Duration, default_interval: Duration) -> Self {
        Self {
            engine,
            max_wait,
            default_interval,
        }
    }

    pub fn from_settings(engine: Arc<QueueEngine>, settings: &LongPollSettings) -> Self {
        Self::new(
            engine,
            Duration::from_secs(settings.max_wait_seconds),
            Duration::from_secs(settings.default_poll_interval_seconds),
        )
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    pub fn default_interval(&self) -> Duration {
        self.default_interval
    }

    /// Wait for a message until one arrives or `max_wait` elapses.
    ///
    /// The first attempt runs immediately. Returns `None` at the ceiling.
    pub async fn poll(
        &self,
        queue_name: &str,
        visibility_timeout: i64,
        poll_interval: Duration,
    ) -> Result<Option<DequeuedMessage>, QueueError> {
        let deadline = Instant::now() + self.max_wait;
        let poll_interval = poll_interval.max(MIN_TICK);
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if tokio::time::timeout_at(deadline, ticker.tick()).await.is_err() {
                break;
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }

            // A parked attempt only wakes on enqueue; messages whose
            // visibility window lapses need a fresh attempt to be seen.
            let attempt_deadline = (now + poll_interval).min(deadline);
            if let Some(message) = self
                .engine
                .dequeue_until(queue_name, visibility_timeout, Some(attempt_deadline))
                .await?
            {
                return Ok(Some(message));
            }
        }

        tracing::debug!(
            queue_name = %queue_name,
            max_wait_ms = self.max_wait.as_millis() as u64,
            "Long poll ended without a message"
        );
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::queue::QueueConfig;
    use crate::sqlite::SqliteDatabase;

    async fn create_test_engine() -> Arc<QueueEngine> {
        let db = SqliteDatabase::connect(&DatabaseConfig::in_memory())
            .await
            .unwrap();
        Arc::new(
            QueueEngine::open(db.pool().clone(), QueueConfig::default())
                .await
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_poll_returns_available_message_immediately() {
        let engine = create_test_engine().await;
        engine.enqueue("orders", "ship#1", 0).await.unwrap();
        let poller = LongPoller::new(engine, Duration::from_secs(5), Duration::from_secs(1));

        let started = std::time::Instant::now();
        let msg = poller
            .poll("orders", 30, Duration::from_secs(1))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(msg.payload, "ship#1");
        assert!(started.elapsed() < Duration::from_millis(900));
    }

    #[tokio::test]
    async fn test_poll_gives_up_at_ceiling() {
        let engine = create_test_engine().await;
        let poller = LongPoller::new(engine, Duration::from_millis(400), Duration::from_secs(1));

        let started = std::time::Instant::now();
        let result = poller
            .poll("orders", 30, Duration::from_millis(100))
            .await
            .unwrap();

        assert!(result.is_none());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(400));
        assert!(elapsed < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_poll_picks_up_late_enqueue() {
        let engine = create_test_engine().await;
        let poller = LongPoller::new(engine.clone(), Duration::from_secs(3), Duration::from_secs(1));

        let producer = {
            let engine = engine.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(300)).await;
                engine.enqueue("orders", "late", 0).await.unwrap();
            })
        };

        let msg = poller
            .poll("orders", 30, Duration::from_millis(100))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(msg.payload, "late");
        producer.await.unwrap();
    }

    #[tokio::test]
    async fn test_poll_sees_message_after_visibility_lapses() {
        let engine = create_test_engine().await;
        engine.enqueue("orders", "retry-me", 0).await.unwrap();
        engine.dequeue("orders", 1).await.unwrap().unwrap();

        let poller = LongPoller::new(engine, Duration::from_secs(4), Duration::from_secs(1));
        let msg = poller
            .poll("orders", 30, Duration::from_millis(200))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(msg.payload, "retry-me");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_contended_polls_record_only_returned_deliveries() {
        let engine = create_test_engine().await;
        for i in 0..10 {
            engine.enqueue("jobs", &format!("job-{}", i), 0).await.unwrap();
        }
        let poller = Arc::new(LongPoller::new(
            engine.clone(),
            Duration::from_millis(300),
            Duration::from_millis(10),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let poller = poller.clone();
                tokio::spawn(async move {
                    let mut delivered = 0;
                    while poller
                        .poll("jobs", 600, Duration::from_millis(10))
                        .await
                        .unwrap()
                        .is_some()
                    {
                        delivered += 1;
                    }
                    delivered
                })
            })
            .collect();

        let mut delivered = 0;
        for handle in handles {
            delivered += handle.await.unwrap();
        }
        assert_eq!(delivered, 10);

        let counts: Vec<i64> = sqlx::query_scalar("SELECT receive_count FROM messages")
            .fetch_all(engine.pool())
            .await
            .unwrap();
        assert_eq!(counts, vec![1; 10]);
    }

    #[tokio::test]
    async fn test_from_settings() {
        let engine = create_test_engine().await;
        let poller = LongPoller::from_settings(engine, &LongPollSettings::default());
        assert_eq!(poller.max_wait(), Duration::from_secs(30));
        assert_eq!(poller.default_interval(), Duration::from_secs(1));
    }
}
