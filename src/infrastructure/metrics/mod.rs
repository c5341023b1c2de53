//! Prometheus metrics for the queue service.
//!
//! This module provides metrics for monitoring the queue engine:
//! - Message flow (enqueued, dequeued, deleted, purged)
//! - Rejections (capacity-bounded enqueues)
//! - Poison handling (inline discards and reaper sweeps)
//! - Per-queue depth, refreshed on scrape

mod helpers;

pub use helpers::{encode_metrics, QueueMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge_vec, IntCounter,
    IntCounterVec, IntGaugeVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "suqs";

lazy_static! {
    // ============================================================================
    // Message Flow Metrics
    // ============================================================================

    /// Messages accepted by enqueue
    pub static ref MESSAGES_ENQUEUED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_enqueued_total", METRIC_PREFIX),
        "Total messages enqueued"
    ).unwrap();

    /// Messages handed to a consumer
    pub static ref MESSAGES_DEQUEUED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_dequeued_total", METRIC_PREFIX),
        "Total messages delivered to consumers"
    ).unwrap();

    /// Messages acknowledged with a delete token
    pub static ref MESSAGES_DELETED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_deleted_total", METRIC_PREFIX),
        "Total messages acknowledged and deleted"
    ).unwrap();

    /// Messages removed by administrative purges
    pub static ref MESSAGES_PURGED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_purged_total", METRIC_PREFIX),
        "Total messages removed by purge operations"
    ).unwrap();

    /// Enqueues rejected because the queue was at capacity
    pub static ref ENQUEUE_REJECTED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_enqueue_rejected_total", METRIC_PREFIX),
        "Total enqueue attempts rejected because the queue was full"
    ).unwrap();

    // ============================================================================
    // Poison & Waiting Metrics
    // ============================================================================

    /// Poison messages discarded, by where they were caught
    pub static ref POISON_DISCARDED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_poison_discarded_total", METRIC_PREFIX),
        "Total poison messages discarded",
        &["source"]
    ).unwrap();

    /// Dequeue attempts that parked on the wake signal
    pub static ref DEQUEUE_PARKED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_dequeue_parked_total", METRIC_PREFIX),
        "Total dequeue attempts that waited for a new message"
    ).unwrap();

    // ============================================================================
    // Queue Depth
    // ============================================================================

    /// Eligible messages per queue
    pub static ref QUEUE_DEPTH: IntGaugeVec = register_int_gauge_vec!(
        format!("{}_queue_depth", METRIC_PREFIX),
        "Eligible messages per queue",
        &["queue"]
    ).unwrap();
}
