//! Queue engine errors

use thiserror::Error;

/// Errors that can occur during queue engine operations.
///
/// An unknown delete token or an empty queue is not an error; those surface
/// as `false` / `None` from the operation itself.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue already holds its maximum number of eligible messages
    #[error("queue {queue_name} is full (max length: {max_length})")]
    QueueFull { queue_name: String, max_length: usize },

    /// The durable store failed; nothing from the attempt was committed
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}
