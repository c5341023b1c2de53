use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

use super::handlers::{delete, delete_all, dequeue, enqueue, list_queues, purge_all, queue_length};
use super::health::health;
use super::metrics::prometheus_metrics;
use super::stats::stats_page;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Queue operations
        .route("/enqueue", post(enqueue))
        .route("/dequeue", post(dequeue))
        .route("/delete", post(delete))
        .route("/delete_all", post(delete_all))
        .route("/purge_all", post(purge_all))
        .route("/queue_length", post(queue_length))
        .route("/queues", get(list_queues))
        // Observability
        .route("/stats", get(stats_page))
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
}
