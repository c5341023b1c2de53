//! API layer - HTTP endpoint handlers.

mod handlers;
mod health;
mod metrics;
mod models;
mod routes;
mod stats;

pub use handlers::{
    delete, delete_all, dequeue, enqueue, list_queues, purge_all, queue_length,
    QueueLengthResponse,
};
pub use health::{health, DatabaseHealthResponse, HealthResponse};
pub use metrics::prometheus_metrics;
pub use models::{
    validate_queue_name, DeleteRequest, DequeueRequest, EnqueueRequest, PurgeResponse,
    QueueNameRequest,
};
pub use routes::api_routes;
pub use stats::{stats_page, RequestStats, RequestStatsSnapshot};
