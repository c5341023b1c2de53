use std::sync::Arc;
use std::time::Instant;

use crate::api::RequestStats;
use crate::config::Settings;
use crate::queue::{LongPoller, QueueEngine};
use crate::sqlite::SqliteDatabase;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub database: SqliteDatabase,
    pub engine: Arc<QueueEngine>,
    pub long_poller: Arc<LongPoller>,
    pub request_stats: Arc<RequestStats>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings, database: SqliteDatabase, engine: Arc<QueueEngine>) -> Self {
        let long_poller = Arc::new(LongPoller::from_settings(engine.clone(), &settings.long_poll));

        Self {
            settings: Arc::new(settings),
            database,
            engine,
            long_poller,
            request_stats: Arc::new(RequestStats::new()),
            start_time: Instant::now(),
        }
    }
}
