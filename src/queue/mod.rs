//! Message queue engine.
//!
//! Named queues share a single durable `messages` table. Consumers take the
//! best eligible message of a queue, which hides it for a visibility timeout
//! and hands out a single-use delete token; acknowledging with that token
//! removes the message for good. Messages that are never acknowledged come
//! back once their timeout lapses (at-least-once delivery), until their
//! receive count passes the poison threshold and they are discarded.
//!
//! # Architecture
//!
//! - `store`: the SQL statements over the `messages` table
//! - `QueueEngine`: the engine lock, wake signal and the queue operations
//! - `LongPoller`: bounded waiting for request handlers
//!
//! Queues are implicit: the first enqueue into a name creates it.

mod engine;
mod error;
pub mod long_poll;
mod models;
pub mod store;

pub use engine::QueueEngine;
pub use error::QueueError;
pub use long_poll::{LongPoller, MAX_POLL_INTERVAL_SECS, MIN_POLL_INTERVAL_SECS};
pub use models::{
    clamp_visibility_timeout, DequeuedMessage, Message, QueueConfig, QueueCount,
    DEFAULT_VISIBILITY_TIMEOUT_SECS, MAX_VISIBILITY_TIMEOUT_SECS,
};
