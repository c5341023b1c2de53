//! Durable message store.
//!
//! Every statement the engine issues lives here. Functions are generic over
//! the sqlx executor so the same statement runs against the pool (the
//! advisory fast path, introspection) or inside an open transaction (the
//! select-then-update sequences of enqueue and dequeue).
//!
//! Table layout:
//! - `messages` - one row per message across all queues

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};

use super::models::{Message, QueueCount};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    queue_name TEXT NOT NULL,
    message TEXT NOT NULL,
    visibility_timestamp INTEGER NOT NULL DEFAULT 0,
    delete_token TEXT,
    receive_count INTEGER NOT NULL DEFAULT 0,
    priority INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_queue_visibility
ON messages(queue_name, visibility_timestamp);

CREATE INDEX IF NOT EXISTS idx_messages_delete_token
ON messages(delete_token);
"#;

const SELECT_BEST: &str = r#"
SELECT id, queue_name, message, visibility_timestamp, delete_token,
       receive_count, priority, created_at
FROM messages
WHERE queue_name = ? AND visibility_timestamp <= ?
ORDER BY priority DESC, created_at DESC, id DESC
LIMIT 1
"#;

/// Current time in unix seconds, the resolution of visibility timestamps.
pub fn now_secs() -> i64 {
    Utc::now().timestamp()
}

/// Current time in unix nanoseconds, the resolution of `created_at`.
pub fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

/// Create the messages table and its indexes if they do not exist.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

/// Insert a new, immediately visible message and return its id.
pub async fn insert<'e, E>(
    executor: E,
    queue_name: &str,
    payload: &str,
    priority: i64,
    created_at: i64,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "INSERT INTO messages (queue_name, message, priority, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(queue_name)
    .bind(payload)
    .bind(priority)
    .bind(created_at)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Count messages of a queue that are eligible at `now`.
pub async fn count_eligible<'e, E>(executor: E, queue_name: &str, now: i64) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM messages WHERE queue_name = ? AND visibility_timestamp <= ?",
    )
    .bind(queue_name)
    .bind(now)
    .fetch_one(executor)
    .await
}

/// Select the message that should be delivered next from a queue.
///
/// Highest priority wins; within a priority the most recently created
/// message comes first, then the highest id.
pub async fn select_best<'e, E>(
    executor: E,
    queue_name: &str,
    now: i64,
) -> Result<Option<Message>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Message>(SELECT_BEST)
        .bind(queue_name)
        .bind(now)
        .fetch_optional(executor)
        .await
}

/// Hide a message until `visible_at`, stamp a new delete token and count
/// the delivery.
pub async fn mark_received<'e, E>(
    executor: E,
    id: i64,
    visible_at: i64,
    delete_token: &str,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE messages
        SET visibility_timestamp = ?, delete_token = ?, receive_count = receive_count + 1
        WHERE id = ?
        "#,
    )
    .bind(visible_at)
    .bind(delete_token)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete_by_id<'e, E>(executor: E, id: i64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

pub async fn delete_by_token<'e, E>(executor: E, delete_token: &str) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM messages WHERE delete_token = ?")
        .bind(delete_token)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// Delete every message, in any queue, whose receive count exceeds `threshold`.
pub async fn delete_poisoned<'e, E>(executor: E, threshold: i64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM messages WHERE receive_count > ?")
        .bind(threshold)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// Delete every message of one queue, hidden or not.
pub async fn purge_queue<'e, E>(executor: E, queue_name: &str) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM messages WHERE queue_name = ?")
        .bind(queue_name)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// Delete every message in the store.
pub async fn purge_all<'e, E>(executor: E) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM messages").execute(executor).await?;
    Ok(result.rows_affected())
}

/// Eligible message counts grouped by queue name.
pub async fn eligible_counts<'e, E>(executor: E, now: i64) -> Result<Vec<QueueCount>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, QueueCount>(
        r#"
        SELECT queue_name, COUNT(*) AS count
        FROM messages
        WHERE visibility_timestamp <= ?
        GROUP BY queue_name
        ORDER BY queue_name
        "#,
    )
    .bind(now)
    .fetch_all(executor)
    .await
}
