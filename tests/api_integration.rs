//! HTTP surface tests
//!
//! Requests go through the full router (tracing and CORS layers included)
//! with `tower::ServiceExt::oneshot`; no socket is bound.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use suqs::config::{DatabaseConfig, Settings};
use suqs::queue::{QueueConfig, QueueEngine};
use suqs::server::{create_app, AppState};
use suqs::sqlite::SqliteDatabase;

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_queue(QueueConfig::default()).await
    }

    async fn with_queue(queue: QueueConfig) -> Self {
        let mut settings = Settings::default();
        settings.database = DatabaseConfig::in_memory();
        settings.long_poll.max_wait_seconds = 1;

        let database = SqliteDatabase::connect(&settings.database).await.unwrap();
        let engine = Arc::new(
            QueueEngine::open(database.pool().clone(), queue)
                .await
                .unwrap(),
        );
        let state = AppState::new(settings, database, engine);

        Self {
            router: create_app(state.clone()),
            state,
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(body.map(Body::from).unwrap_or_else(Body::empty))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
        self.send(Method::POST, uri, Some(body.to_string())).await
    }

    async fn get(&self, uri: &str) -> (StatusCode, Vec<u8>) {
        self.send(Method::GET, uri, None).await
    }
}

fn as_json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn enqueue_dequeue_delete_round_trip() {
    let app = TestApp::new().await;

    let (status, _) = app
        .post("/enqueue", json!({"queue_name": "orders", "message": "ship#1"}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post("/dequeue", json!({"queue_name": "orders", "visibility_timeout": 30}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let body = as_json(&body);
    assert_eq!(body["message"], "ship#1");
    let token = body["delete_token"].as_str().unwrap().to_string();

    let (status, _) = app.post("/delete", json!({"delete_token": token})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.post("/delete", json!({"delete_token": token})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(as_json(&body)["error"]["code"], "NOT_FOUND");

    let stats = app.state.request_stats.snapshot();
    assert_eq!(stats.enqueue, 1);
    assert_eq!(stats.dequeue, 1);
    assert_eq!(stats.delete, 1);
}

#[tokio::test]
async fn dequeue_empty_queue_returns_no_content_after_ceiling() {
    let app = TestApp::new().await;

    let started = std::time::Instant::now();
    let (status, body) = app
        .post(
            "/dequeue",
            json!({"queue_name": "orders", "database_poll_interval": 1}),
        )
        .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
    assert!(started.elapsed() >= std::time::Duration::from_millis(900));
    assert_eq!(app.state.request_stats.snapshot().dequeue, 0);
}

#[tokio::test]
async fn invalid_bodies_are_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(Method::POST, "/enqueue", Some("not json".to_string()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(as_json(&body)["error"]["message"], "Invalid request body");

    let (status, _) = app
        .post("/enqueue", json!({"queue_name": "bad name", "message": "x"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/enqueue", json!({"queue_name": "orders", "message": ""}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/dequeue",
            json!({"queue_name": "orders", "database_poll_interval": 9}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/delete", json!({"delete_token": "not-a-uuid"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(app.state.request_stats.snapshot().enqueue, 0);
}

#[tokio::test]
async fn full_queue_maps_to_too_many_requests() {
    let app = TestApp::with_queue(QueueConfig {
        max_queue_length: 1,
        ..Default::default()
    })
    .await;

    let (status, _) = app
        .post("/enqueue", json!({"queue_name": "orders", "message": "1"}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post("/enqueue", json!({"queue_name": "orders", "message": "2"}))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(as_json(&body)["error"]["code"], "QUEUE_FULL");
}

#[tokio::test]
async fn introspection_and_purges() {
    let app = TestApp::new().await;
    for (queue, message) in [("a", "1"), ("a", "2"), ("b", "3")] {
        app.post("/enqueue", json!({"queue_name": queue, "message": message}))
            .await;
    }

    let (status, body) = app.post("/queue_length", json!({"queue_name": "a"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), json!({"queue_name": "a", "count": 2}));

    let (status, body) = app.get("/queues").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        as_json(&body),
        json!([{"queue_name": "a", "count": 2}, {"queue_name": "b", "count": 1}])
    );

    let (status, body) = app.post("/delete_all", json!({"queue_name": "a"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body)["deleted"], 2);

    let (status, body) = app.send(Method::POST, "/purge_all", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body)["deleted"], 1);

    let (_, body) = app.get("/queues").await;
    assert_eq!(as_json(&body), json!([]));
}

#[tokio::test]
async fn stats_health_and_metrics_pages() {
    let app = TestApp::new().await;
    app.post("/enqueue", json!({"queue_name": "orders", "message": "x"}))
        .await;

    let (status, body) = app.get("/stats").await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("Enqueue Count: 1"));

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    let health = as_json(&body);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["database"]["connected"], true);
    assert_eq!(health["database"]["location"], ":memory:");

    let (status, body) = app.get("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("suqs_messages_enqueued_total"));
}
