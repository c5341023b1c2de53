//! Queue data models

use serde::Serialize;
use sqlx::FromRow;

use crate::config::QueueSettings;

/// Visibility timeout applied when the caller passes zero.
pub const DEFAULT_VISIBILITY_TIMEOUT_SECS: i64 = 30;

/// Upper bound on a visibility timeout (12 hours).
pub const MAX_VISIBILITY_TIMEOUT_SECS: i64 = 43_200;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Maximum number of eligible messages a queue may hold
    pub max_queue_length: usize,
    /// Deliveries allowed per message; the reaper removes rows past it
    pub poison_threshold: i64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_queue_length: 5000,
            poison_threshold: 4,
        }
    }
}

impl From<&QueueSettings> for QueueConfig {
    fn from(settings: &QueueSettings) -> Self {
        Self {
            max_queue_length: settings.max_length,
            poison_threshold: settings.poison_threshold,
        }
    }
}

/// A row of the `messages` table.
#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: i64,
    pub queue_name: String,
    #[sqlx(rename = "message")]
    pub payload: String,
    /// Unix seconds; the message is eligible once this is <= now
    pub visibility_timestamp: i64,
    pub delete_token: Option<String>,
    pub receive_count: i64,
    pub priority: i64,
    /// Unix nanoseconds
    pub created_at: i64,
}

impl Message {
    pub fn is_eligible(&self, now: i64) -> bool {
        self.visibility_timestamp <= now
    }

    /// Whether a dequeue attempt must discard this row instead of
    /// delivering it. A message is delivered at most `threshold` times.
    pub fn is_poisoned(&self, threshold: i64) -> bool {
        self.receive_count >= threshold
    }
}

/// A message handed to a consumer together with its acknowledgment token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DequeuedMessage {
    #[serde(rename = "message")]
    pub payload: String,
    pub delete_token: String,
}

/// Eligible message count for one queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct QueueCount {
    pub queue_name: String,
    pub count: i64,
}

/// Clamp a requested visibility timeout into the accepted range.
///
/// Zero selects the default; negatives become zero.
pub fn clamp_visibility_timeout(requested: i64) -> i64 {
    if requested == 0 {
        DEFAULT_VISIBILITY_TIMEOUT_SECS
    } else {
        requested.clamp(0, MAX_VISIBILITY_TIMEOUT_SECS)
    }
}
