//! Consumer loop span helpers.

use tracing::Span;
use uuid::Uuid;

/// Start a span covering one consumer's lifetime.
///
/// The `consumer.state` field is declared empty and is filled in by
/// [`record_state_transition`].
pub fn start_consumer_span(queue: &str, consumer_id: &Uuid) -> Span {
    tracing::info_span!(
        "consumer.run",
        "queue.key" = queue,
        "consumer.id" = %consumer_id,
        "consumer.state" = tracing::field::Empty,
    )
}

/// Record a state transition on the consumer span.
pub fn record_state_transition(span: &Span, from: &str, to: &str) {
    span.record("consumer.state", to);
    span.in_scope(|| {
        tracing::debug!(from = from, to = to, "state_transition");
    });
}
