//! SQLite persistence module.
//!
//! Provides the connection pool for the durable message store.

pub mod pool;

pub use pool::SqliteDatabase;
