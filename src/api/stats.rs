//! Per-endpoint request tallies and the `/stats` page.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::{extract::State, response::Html};
use serde::Serialize;

use crate::server::AppState;

/// Successful request counts, owned by the HTTP layer.
#[derive(Debug, Default)]
pub struct RequestStats {
    enqueue: AtomicU64,
    dequeue: AtomicU64,
    delete: AtomicU64,
    queue_length: AtomicU64,
    list_queues: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequestStatsSnapshot {
    pub enqueue: u64,
    pub dequeue: u64,
    pub delete: u64,
    pub queue_length: u64,
    pub list_queues: u64,
}

impl RequestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_enqueue(&self) {
        self.enqueue.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dequeue(&self) {
        self.dequeue.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self) {
        self.delete.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_queue_length(&self) {
        self.queue_length.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_list_queues(&self) {
        self.list_queues.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RequestStatsSnapshot {
        RequestStatsSnapshot {
            enqueue: self.enqueue.load(Ordering::Relaxed),
            dequeue: self.dequeue.load(Ordering::Relaxed),
            delete: self.delete.load(Ordering::Relaxed),
            queue_length: self.queue_length.load(Ordering::Relaxed),
            list_queues: self.list_queues.load(Ordering::Relaxed),
        }
    }
}

impl RequestStatsSnapshot {
    pub fn render_html(&self) -> String {
        format!(
            "<html>\n\
             <head><title>Stats</title></head>\n\
             <body>\n\
             <h1>Stats</h1>\n\
             <ul>\n\
             <li>Enqueue Count: {}</li>\n\
             <li>Dequeue Count: {}</li>\n\
             <li>Delete Count: {}</li>\n\
             <li>Get Queue Length Count: {}</li>\n\
             <li>Get Unique Queue Names Count: {}</li>\n\
             </ul>\n\
             </body>\n\
             </html>\n",
            self.enqueue, self.dequeue, self.delete, self.queue_length, self.list_queues
        )
    }
}

/// GET /stats
pub async fn stats_page(State(state): State<AppState>) -> Html<String> {
    Html(state.request_stats.snapshot().render_html())
}
