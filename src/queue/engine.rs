//! The queue engine.
//!
//! All queues share one `messages` table and one engine lock. The lock
//! serializes every mutation of the store; the wake signal lets a dequeue
//! that lost the race for a message sleep until an enqueue (or a poison
//! discard) gives it a reason to look again.
//!
//! # Waiting
//!
//! A parked dequeue registers interest in the wake signal while it still
//! holds the lock and only then releases it. Every enqueue broadcasts the
//! signal while holding the lock, so a wake-up can never fall between a
//! failed selection and the park.
//!
//! Deadlines only apply where nothing has been changed yet: while waiting
//! for the lock and while parked. Once an attempt holds the lock it runs to
//! completion, so a row is never marked received unless the caller also gets
//! the token. `dequeue_until` takes the deadline; dropping a dequeue future
//! from outside while it holds the lock can commit a delivery nobody sees.

use sqlx::SqlitePool;
use tokio::sync::{Mutex, MutexGuard, Notify};
use tokio::time::Instant;
use uuid::Uuid;

use crate::metrics::QueueMetrics;

use super::error::QueueError;
use super::models::{clamp_visibility_timeout, DequeuedMessage, QueueConfig, QueueCount};
use super::store;

pub struct QueueEngine {
    pool: SqlitePool,
    lock: Mutex<()>,
    wake: Notify,
    config: QueueConfig,
}

impl QueueEngine {
    /// Open the engine over a pool, creating the schema if needed.
    pub async fn open(pool: SqlitePool, config: QueueConfig) -> Result<Self, QueueError> {
        store::ensure_schema(&pool).await?;

        tracing::info!(
            max_queue_length = config.max_queue_length,
            poison_threshold = config.poison_threshold,
            "Queue engine ready"
        );

        Ok(Self {
            pool,
            lock: Mutex::new(()),
            wake: Notify::new(),
            config,
        })
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Add a message to a queue.
    ///
    /// Fails with `QueueFull` without inserting anything when the queue
    /// already holds `max_queue_length` eligible messages.
    pub async fn enqueue(
        &self,
        queue_name: &str,
        payload: &str,
        priority: i64,
    ) -> Result<(), QueueError> {
        let _guard = self.lock.lock().await;

        let mut tx = self.pool.begin().await?;
        let eligible = store::count_eligible(&mut *tx, queue_name, store::now_secs()).await?;

        if eligible >= self.config.max_queue_length as i64 {
            tx.rollback().await?;
            QueueMetrics::record_rejected();
            tracing::warn!(
                queue_name = %queue_name,
                eligible = eligible,
                max_length = self.config.max_queue_length,
                "Rejected enqueue into full queue"
            );
            return Err(QueueError::QueueFull {
                queue_name: queue_name.to_string(),
                max_length: self.config.max_queue_length,
            });
        }

        let id = store::insert(&mut *tx, queue_name, payload, priority, store::now_nanos()).await?;
        tx.commit().await?;

        self.wake.notify_waiters();
        QueueMetrics::record_enqueued();

        tracing::debug!(
            queue_name = %queue_name,
            message_id = id,
            priority = priority,
            "Message enqueued"
        );

        Ok(())
    }

    /// Take the best eligible message of a queue and hide it for
    /// `visibility_timeout` seconds.
    ///
    /// Returns `None` straight away when the queue looks empty. When a
    /// candidate was seen but another consumer claims it first, the call
    /// parks until the wake signal fires and tries again.
    pub async fn dequeue(
        &self,
        queue_name: &str,
        visibility_timeout: i64,
    ) -> Result<Option<DequeuedMessage>, QueueError> {
        self.dequeue_until(queue_name, visibility_timeout, None).await
    }

    /// `dequeue` that gives up with `None` once `deadline` passes while it
    /// is waiting for the lock or parked.
    pub async fn dequeue_until(
        &self,
        queue_name: &str,
        visibility_timeout: i64,
        deadline: Option<Instant>,
    ) -> Result<Option<DequeuedMessage>, QueueError> {
        // Advisory only: skips the lock for empty queues, re-checked below.
        if store::select_best(&self.pool, queue_name, store::now_secs())
            .await?
            .is_none()
        {
            return Ok(None);
        }

        let visibility_timeout = clamp_visibility_timeout(visibility_timeout);
        let Some(mut guard) = self.lock_until(deadline).await else {
            return Ok(None);
        };

        loop {
            let now = store::now_secs();
            let mut tx = self.pool.begin().await?;

            let Some(candidate) = store::select_best(&mut *tx, queue_name, now).await? else {
                tx.rollback().await?;

                let notified = self.wake.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                drop(guard);

                QueueMetrics::record_parked();
                tracing::trace!(queue_name = %queue_name, "Dequeue parked until next enqueue");

                let woken = match deadline {
                    Some(deadline) => tokio::time::timeout_at(deadline, notified).await.is_ok(),
                    None => {
                        notified.await;
                        true
                    }
                };
                if !woken {
                    return Ok(None);
                }

                guard = match self.lock_until(deadline).await {
                    Some(guard) => guard,
                    None => return Ok(None),
                };
                continue;
            };

            debug_assert!(candidate.is_eligible(now));

            if candidate.is_poisoned(self.config.poison_threshold) {
                store::delete_by_id(&mut *tx, candidate.id).await?;
                tx.commit().await?;

                self.wake.notify_waiters();
                QueueMetrics::record_poison_on_dequeue();
                tracing::warn!(
                    queue_name = %queue_name,
                    message_id = candidate.id,
                    receive_count = candidate.receive_count,
                    "Discarded poison message"
                );
                continue;
            }

            let delete_token = Uuid::new_v4().to_string();
            store::mark_received(&mut *tx, candidate.id, now + visibility_timeout, &delete_token)
                .await?;
            tx.commit().await?;

            QueueMetrics::record_dequeued();
            tracing::debug!(
                queue_name = %queue_name,
                message_id = candidate.id,
                receive_count = candidate.receive_count + 1,
                visibility_timeout = visibility_timeout,
                "Message dequeued"
            );

            return Ok(Some(DequeuedMessage {
                payload: candidate.payload,
                delete_token,
            }));
        }
    }

    /// Acquire the engine lock, or `None` if `deadline` passes first.
    async fn lock_until(&self, deadline: Option<Instant>) -> Option<MutexGuard<'_, ()>> {
        match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, self.lock.lock()).await.ok(),
            None => Some(self.lock.lock().await),
        }
    }

    /// Acknowledge a message. Returns `false` for unknown or stale tokens.
    pub async fn delete(&self, delete_token: &str) -> Result<bool, QueueError> {
        let _guard = self.lock.lock().await;

        let deleted = store::delete_by_token(&self.pool, delete_token).await? > 0;
        if deleted {
            QueueMetrics::record_deleted();
            tracing::debug!("Message acknowledged");
        }

        Ok(deleted)
    }

    /// Eligible messages in a queue right now.
    pub async fn queue_length(&self, queue_name: &str) -> Result<i64, QueueError> {
        let _guard = self.lock.lock().await;
        Ok(store::count_eligible(&self.pool, queue_name, store::now_secs()).await?)
    }

    /// Eligible message counts of every queue that has any.
    pub async fn list_queues(&self) -> Result<Vec<QueueCount>, QueueError> {
        let _guard = self.lock.lock().await;
        Ok(store::eligible_counts(&self.pool, store::now_secs()).await?)
    }

    /// Remove every message of one queue, including hidden ones.
    pub async fn purge_queue(&self, queue_name: &str) -> Result<u64, QueueError> {
        let _guard = self.lock.lock().await;

        let removed = store::purge_queue(&self.pool, queue_name).await?;
        QueueMetrics::record_purged(removed);
        tracing::info!(queue_name = %queue_name, removed = removed, "Queue purged");

        Ok(removed)
    }

    /// Remove every message of every queue.
    pub async fn purge_all(&self) -> Result<u64, QueueError> {
        let _guard = self.lock.lock().await;

        let removed = store::purge_all(&self.pool).await?;
        QueueMetrics::record_purged(removed);
        tracing::warn!(removed = removed, "All queues purged");

        Ok(removed)
    }

    /// Delete every message whose receive count is past the poison threshold.
    pub async fn reap_poisoned(&self) -> Result<u64, QueueError> {
        let _guard = self.lock.lock().await;

        let removed = store::delete_poisoned(&self.pool, self.config.poison_threshold).await?;
        if removed > 0 {
            QueueMetrics::record_poison_reaped(removed);
        }

        Ok(removed)
    }

    /// Round-trip to the store.
    pub async fn ping(&self) -> Result<(), QueueError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
