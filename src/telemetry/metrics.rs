//! Metric instrument factories for listq.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"listq"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for listq instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("listq")
}

/// Counter: queue-level operations (enqueue, dequeue, dequeue_empty, size).
/// Labels: `queue`, `operation`, `result` ("ok" | "error").
pub fn queue_operations() -> Counter<u64> {
    meter()
        .u64_counter("listq.queue.operations")
        .with_description("Number of queue operations")
        .build()
}

/// Counter: records handed to the sink.
/// Labels: `queue`, `result` ("ok" | "error").
pub fn records_dispatched() -> Counter<u64> {
    meter()
        .u64_counter("listq.consumer.dispatched")
        .with_description("Number of records dispatched to the sink")
        .build()
}

/// Counter: popped entries that could not be decoded and were dropped.
/// Labels: `queue`.
pub fn records_malformed() -> Counter<u64> {
    meter()
        .u64_counter("listq.consumer.malformed")
        .with_description("Malformed entries removed from the queue")
        .build()
}

/// Counter: polls that found the queue empty or the store unavailable.
/// Labels: `queue`, `reason` ("empty" | "store_error").
pub fn idle_polls() -> Counter<u64> {
    meter()
        .u64_counter("listq.consumer.idle_polls")
        .with_description("Polls that ended in a backoff wait")
        .build()
}

/// Histogram: sink dispatch duration in milliseconds.
/// Labels: `queue`.
pub fn dispatch_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("listq.consumer.dispatch_duration_ms")
        .with_description("Sink dispatch duration in milliseconds")
        .with_unit("ms")
        .build()
}
