//! Queue endpoints.
//!
//! Bodies are decoded from raw bytes so a missing or wrong `Content-Type`
//! does not change the outcome; anything that fails to decode is a 400.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::queue::QueueCount;
use crate::server::AppState;

use super::models::{DeleteRequest, DequeueRequest, EnqueueRequest, PurgeResponse, QueueNameRequest};

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected undecodable request body");
        AppError::Validation("Invalid request body".to_string())
    })
}

#[derive(Debug, Serialize)]
pub struct QueueLengthResponse {
    pub queue_name: String,
    pub count: i64,
}

/// POST /enqueue
#[tracing::instrument(skip_all)]
pub async fn enqueue(State(state): State<AppState>, body: Bytes) -> Result<StatusCode> {
    let request: EnqueueRequest = parse_body(&body)?;
    request.validate()?;

    state
        .engine
        .enqueue(&request.queue_name, &request.message, request.priority)
        .await?;

    state.request_stats.record_enqueue();
    Ok(StatusCode::OK)
}

/// POST /dequeue
///
/// Long-polls for up to the configured ceiling; 204 when nothing arrived.
#[tracing::instrument(skip_all)]
pub async fn dequeue(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let request: DequeueRequest = parse_body(&body)?;
    request.validate()?;

    let poll_interval = match request.database_poll_interval {
        0 => state.long_poller.default_interval(),
        secs => Duration::from_secs(secs),
    };

    let message = state
        .long_poller
        .poll(&request.queue_name, request.visibility_timeout, poll_interval)
        .await?;

    match message {
        Some(message) => {
            state.request_stats.record_dequeue();
            Ok(Json(message).into_response())
        }
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// POST /delete
#[tracing::instrument(skip_all)]
pub async fn delete(State(state): State<AppState>, body: Bytes) -> Result<StatusCode> {
    let request: DeleteRequest = parse_body(&body)?;
    request.validate()?;

    if !state.engine.delete(&request.delete_token).await? {
        return Err(AppError::NotFound("Delete failed".to_string()));
    }

    state.request_stats.record_delete();
    Ok(StatusCode::OK)
}

/// POST /delete_all
#[tracing::instrument(skip_all)]
pub async fn delete_all(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PurgeResponse>> {
    let request: QueueNameRequest = parse_body(&body)?;
    request.validate()?;

    let deleted = state.engine.purge_queue(&request.queue_name).await?;
    Ok(Json(PurgeResponse { deleted }))
}

/// POST /purge_all
#[tracing::instrument(skip_all)]
pub async fn purge_all(State(state): State<AppState>) -> Result<Json<PurgeResponse>> {
    let deleted = state.engine.purge_all().await?;
    Ok(Json(PurgeResponse { deleted }))
}

/// POST /queue_length
#[tracing::instrument(skip_all)]
pub async fn queue_length(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<QueueLengthResponse>> {
    let request: QueueNameRequest = parse_body(&body)?;
    request.validate()?;

    let count = state.engine.queue_length(&request.queue_name).await?;

    state.request_stats.record_queue_length();
    Ok(Json(QueueLengthResponse {
        queue_name: request.queue_name,
        count,
    }))
}

/// GET /queues
#[tracing::instrument(skip_all)]
pub async fn list_queues(State(state): State<AppState>) -> Result<Json<Vec<QueueCount>>> {
    let queues = state.engine.list_queues().await?;

    state.request_stats.record_list_queues();
    Ok(Json(queues))
}
