//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use crate::queue::QueueCount;

use super::{
    DEQUEUE_PARKED_TOTAL, ENQUEUE_REJECTED_TOTAL, MESSAGES_DELETED_TOTAL,
    MESSAGES_DEQUEUED_TOTAL, MESSAGES_ENQUEUED_TOTAL, MESSAGES_PURGED_TOTAL,
    POISON_DISCARDED_TOTAL, QUEUE_DEPTH,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording queue engine metrics
pub struct QueueMetrics;

impl QueueMetrics {
    pub fn record_enqueued() {
        MESSAGES_ENQUEUED_TOTAL.inc();
    }

    pub fn record_rejected() {
        ENQUEUE_REJECTED_TOTAL.inc();
    }

    pub fn record_dequeued() {
        MESSAGES_DEQUEUED_TOTAL.inc();
    }

    pub fn record_deleted() {
        MESSAGES_DELETED_TOTAL.inc();
    }

    pub fn record_purged(count: u64) {
        MESSAGES_PURGED_TOTAL.inc_by(count);
    }

    pub fn record_parked() {
        DEQUEUE_PARKED_TOTAL.inc();
    }

    /// Record a poison message caught inline by a dequeue
    pub fn record_poison_on_dequeue() {
        POISON_DISCARDED_TOTAL.with_label_values(&["dequeue"]).inc();
    }

    /// Record poison messages removed by the background reaper
    pub fn record_poison_reaped(count: u64) {
        POISON_DISCARDED_TOTAL
            .with_label_values(&["reaper"])
            .inc_by(count);
    }

    /// Replace the per-queue depth gauges with a fresh snapshot.
    ///
    /// Queues missing from the snapshot are dropped from the exposition.
    pub fn set_queue_depths(counts: &[QueueCount]) {
        QUEUE_DEPTH.reset();
        for entry in counts {
            QUEUE_DEPTH
                .with_label_values(&[entry.queue_name.as_str()])
                .set(entry.count);
        }
    }
}
