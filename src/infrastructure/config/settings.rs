use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub queue: QueueSettings,
    #[serde(default)]
    pub long_poll: LongPollSettings,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file holding the messages table
    #[serde(default = "default_database_path")]
    pub path: String,
    /// Keep the store in memory instead of on disk
    #[serde(default)]
    pub memory: bool,
    /// Maximum pooled connections (in-memory stores always use one)
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// How long SQLite waits on a locked database before failing
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueSettings {
    /// Maximum number of eligible messages per queue
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// Receive count above which a message is discarded as poison
    #[serde(default = "default_poison_threshold")]
    pub poison_threshold: i64,
    /// Reaper interval in seconds
    #[serde(default = "default_reaper_interval")]
    pub reaper_interval_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LongPollSettings {
    /// Ceiling on how long a dequeue request may wait for a message
    #[serde(default = "default_max_wait")]
    pub max_wait_seconds: u64,
    /// Cadence used when the request does not pick one
    #[serde(default = "default_poll_interval")]
    pub default_poll_interval_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database_path() -> String {
    "message_queue.db".to_string()
}

fn default_pool_size() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    5
}

fn default_max_length() -> usize {
    5000
}

fn default_poison_threshold() -> i64 {
    4
}

fn default_reaper_interval() -> u64 {
    60 // 1 minute
}

fn default_max_wait() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("database.path", default_database_path())?
            .set_default("database.memory", false)?
            .set_default("queue.max_length", default_max_length() as u64)?
            .set_default("queue.poison_threshold", default_poison_threshold())?
            .set_default("queue.reaper_interval_seconds", default_reaper_interval())?
            .set_default("long_poll.max_wait_seconds", default_max_wait())?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // SUQS_SERVER__PORT, SUQS_DATABASE__MEMORY, SUQS_QUEUE__MAX_LENGTH, etc.
            .add_source(
                Environment::with_prefix("SUQS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            memory: false,
            pool_size: default_pool_size(),
            busy_timeout_seconds: default_busy_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// Configuration for a private in-memory store.
    pub fn in_memory() -> Self {
        Self {
            memory: true,
            ..Default::default()
        }
    }
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            poison_threshold: default_poison_threshold(),
            reaper_interval_seconds: default_reaper_interval(),
        }
    }
}

impl Default for LongPollSettings {
    fn default() -> Self {
        Self {
            max_wait_seconds: default_max_wait(),
            default_poll_interval_seconds: default_poll_interval(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
