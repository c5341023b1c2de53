//! Infrastructure layer modules
//!
//! This module contains shared infrastructure components:
//! - `config`: Application configuration and settings
//! - `error`: Unified error types
//! - `metrics`: Prometheus metrics helpers
//! - `sqlite`: SQLite connection pool for the message store

pub mod config;
pub mod error;
pub mod metrics;
pub mod sqlite;
