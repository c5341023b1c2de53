//! SQLite connection pool for the durable message store.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::config::DatabaseConfig;

const IN_MEMORY_URL: &str = "sqlite::memory:";

/// SQLite connection pool backing the message store.
#[derive(Clone)]
pub struct SqliteDatabase {
    /// The underlying connection pool
    pool: SqlitePool,

    /// File path or `:memory:` (for logging purposes)
    location: String,
}

impl SqliteDatabase {
    /// Open a pool from configuration.
    ///
    /// File databases run in WAL mode and are created if missing. In-memory
    /// databases live exactly as long as their connection, so the pool keeps a
    /// single connection that never idles out or expires.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let busy_timeout = Duration::from_secs(config.busy_timeout_seconds);

        let (pool, location) = if config.memory {
            let options = SqliteConnectOptions::from_str(IN_MEMORY_URL)?.busy_timeout(busy_timeout);
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?;
            (pool, ":memory:".to_string())
        } else {
            let options = SqliteConnectOptions::new()
                .filename(&config.path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(busy_timeout);
            let pool = SqlitePoolOptions::new()
                .max_connections(config.pool_size.max(1))
                .connect_with(options)
                .await?;
            (pool, config.path.clone())
        };

        tracing::info!(
            location = %location,
            max_connections = pool.options().get_max_connections(),
            "SQLite connection pool created"
        );

        Ok(Self { pool, location })
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Where the data lives, for logs and health output.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn is_in_memory(&self) -> bool {
        self.location == ":memory:"
    }

    /// Close the pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!(location = %self.location, "SQLite connection pool closed");
    }
}
