mod settings;

pub use settings::{
    DatabaseConfig, LogConfig, LongPollSettings, QueueSettings, ServerConfig, Settings,
};
