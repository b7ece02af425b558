//! Consumer loop: drain a queue into a sink, backing off while it is idle.
//!
//! ```text
//! Polling ──record──▶ Processing ──done──▶ Polling   (backoff reset)
//! Polling ──empty / store error──▶ BackoffWait ──elapsed──▶ Polling
//! Polling ──malformed entry──▶ Polling               (entry dropped, reported)
//! ```
//!
//! The stop token is checked before every poll and raced against every
//! backoff sleep. A record that has been popped is always dispatched before
//! the loop looks at the token again.

use crate::backoff::{Backoff, BackoffPolicy};
use crate::error::Error;
use crate::queue::{QueueClient, Record};
use crate::shutdown::ShutdownToken;
use crate::sink::Sink;
use crate::store::ListStore;
use crate::telemetry::consumer::{record_state_transition, start_consumer_span};
use crate::telemetry::metrics;
use opentelemetry::KeyValue;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{Instrument, Span, debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Polling,
    BackoffWait,
    Processing,
}

impl ConsumerState {
    pub fn as_str(self) -> &'static str {
        match self {
            ConsumerState::Polling => "polling",
            ConsumerState::BackoffWait => "backoff_wait",
            ConsumerState::Processing => "processing",
        }
    }
}

impl fmt::Display for ConsumerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something worth reporting that happened inside the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumerEvent {
    Transition {
        from: ConsumerState,
        to: ConsumerState,
    },
    /// The sink accepted a record.
    Dispatched { elapsed: Duration },
    /// The queue was empty; the loop will sleep for `wait`.
    Idle { wait: Duration },
    /// A popped entry failed to decode and has been dropped.
    Malformed { payload: String, error: String },
    /// The store call failed; the loop will sleep for `wait`.
    StoreError { error: String, wait: Duration },
    SinkFailed { error: String },
    Stopped { stats: ConsumerStats },
}

/// Receives every [`ConsumerEvent`].
pub trait ConsumerObserver: Send + Sync {
    fn observe(&self, event: &ConsumerEvent);
}

/// Default observer: structured logs plus OTel metrics.
pub struct TracingObserver {
    queue: String,
}

impl TracingObserver {
    pub fn new(queue: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
        }
    }

    fn queue_label(&self) -> KeyValue {
        KeyValue::new("queue", self.queue.clone())
    }
}

impl ConsumerObserver for TracingObserver {
    fn observe(&self, event: &ConsumerEvent) {
        match event {
            ConsumerEvent::Transition { .. } => {}
            ConsumerEvent::Dispatched { elapsed } => {
                debug!(elapsed_ms = elapsed.as_millis() as u64, "record dispatched");
                metrics::records_dispatched()
                    .add(1, &[self.queue_label(), KeyValue::new("result", "ok")]);
                metrics::dispatch_duration_ms()
                    .record(elapsed.as_secs_f64() * 1000.0, &[self.queue_label()]);
            }
            ConsumerEvent::Idle { wait } => {
                info!(wait_ms = wait.as_millis() as u64, "no data, waiting {}s", wait.as_secs_f64());
                metrics::idle_polls()
                    .add(1, &[self.queue_label(), KeyValue::new("reason", "empty")]);
            }
            ConsumerEvent::Malformed { payload, error } => {
                error!(%payload, %error, "dropped malformed queue entry");
                metrics::records_malformed().add(1, &[self.queue_label()]);
            }
            ConsumerEvent::StoreError { error, wait } => {
                warn!(%error, wait_ms = wait.as_millis() as u64, "store unavailable, backing off");
                metrics::idle_polls()
                    .add(1, &[self.queue_label(), KeyValue::new("reason", "store_error")]);
            }
            ConsumerEvent::SinkFailed { error } => {
                error!(%error, "sink failed to accept record");
                metrics::records_dispatched()
                    .add(1, &[self.queue_label(), KeyValue::new("result", "error")]);
            }
            ConsumerEvent::Stopped { stats } => {
                info!(
                    processed = stats.processed,
                    malformed = stats.malformed,
                    sink_failures = stats.sink_failures,
                    store_errors = stats.store_errors,
                    empty_polls = stats.empty_polls,
                    "consumer stopped"
                );
            }
        }
    }
}

/// Counters accumulated over a consumer's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub processed: u64,
    pub malformed: u64,
    pub sink_failures: u64,
    pub store_errors: u64,
    pub empty_polls: u64,
}

/// What one poll ended in.
enum Poll {
    Handled,
    Wait(Duration),
}

pub struct Consumer<S: ?Sized> {
    id: Uuid,
    queue: QueueClient<S>,
    sink: Arc<dyn Sink>,
    observer: Arc<dyn ConsumerObserver>,
    backoff: Backoff,
    state: ConsumerState,
    stats: ConsumerStats,
    span: Span,
}

impl<S: ListStore + ?Sized + 'static> Consumer<S> {
    pub fn new(queue: QueueClient<S>, sink: Arc<dyn Sink>, policy: BackoffPolicy) -> Self {
        let id = Uuid::new_v4();
        let span = start_consumer_span(queue.key(), &id);
        let observer = Arc::new(TracingObserver::new(queue.key()));
        Self {
            id,
            queue,
            sink,
            observer,
            backoff: Backoff::new(policy),
            state: ConsumerState::Polling,
            stats: ConsumerStats::default(),
            span,
        }
    }

    /// Replace the default [`TracingObserver`].
    pub fn with_observer(mut self, observer: Arc<dyn ConsumerObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> ConsumerState {
        self.state
    }

    pub fn stats(&self) -> &ConsumerStats {
        &self.stats
    }

    /// Poll until `shutdown` fires. Returns the final counters.
    pub async fn run(&mut self, mut shutdown: ShutdownToken) -> ConsumerStats {
        let span = self.span.clone();
        async {
            info!(backoff = ?self.backoff.policy(), "consumer started");

            while !shutdown.is_shutdown() {
                let Poll::Wait(wait) = self.poll_once().await else {
                    continue;
                };

                self.transition(ConsumerState::BackoffWait);
                tokio::select! {
                    _ = shutdown.wait() => {}
                    _ = tokio::time::sleep(wait) => {}
                }
                self.transition(ConsumerState::Polling);
            }

            self.finish()
        }
        .instrument(span)
        .await
    }

    /// Process records until the queue is empty, then return.
    ///
    /// Store failures end the drain with the error instead of backing off.
    pub async fn drain(&mut self) -> crate::error::Result<ConsumerStats> {
        let span = self.span.clone();
        async {
            loop {
                match self.queue.dequeue().await {
                    Ok(Some(record)) => self.process(record).await,
                    Ok(None) => return Ok(self.finish()),
                    Err(Error::Deserialization { payload, source }) => {
                        self.malformed(payload, source.to_string())
                    }
                    Err(e) => {
                        self.stats.store_errors += 1;
                        return Err(e);
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn poll_once(&mut self) -> Poll {
        match self.queue.dequeue().await {
            Ok(Some(record)) => {
                self.process(record).await;
                Poll::Handled
            }
            Ok(None) => {
                self.stats.empty_polls += 1;
                let wait = self.backoff.next_delay();
                self.emit(ConsumerEvent::Idle { wait });
                Poll::Wait(wait)
            }
            Err(Error::Deserialization { payload, source }) => {
                self.malformed(payload, source.to_string());
                Poll::Handled
            }
            Err(e) => {
                // Anything else from the store is handled like a lost connection.
                self.stats.store_errors += 1;
                let wait = self.backoff.next_delay();
                self.emit(ConsumerEvent::StoreError {
                    error: e.to_string(),
                    wait,
                });
                Poll::Wait(wait)
            }
        }
    }

    async fn process(&mut self, record: Record) {
        self.transition(ConsumerState::Processing);
        let started = Instant::now();

        // Run the sink on its own task so a panic is contained to this record.
        let sink = Arc::clone(&self.sink);
        let outcome =
            tokio::spawn(async move { sink.dispatch(record).await }.instrument(self.span.clone()))
                .await;

        match outcome {
            Ok(Ok(())) => {
                self.stats.processed += 1;
                self.emit(ConsumerEvent::Dispatched {
                    elapsed: started.elapsed(),
                });
            }
            Ok(Err(e)) => {
                self.stats.sink_failures += 1;
                self.emit(ConsumerEvent::SinkFailed {
                    error: format!("{e:#}"),
                });
            }
            Err(join) => {
                self.stats.sink_failures += 1;
                self.emit(ConsumerEvent::SinkFailed {
                    error: format!("sink panicked: {join}"),
                });
            }
        }

        self.backoff.reset();
        self.transition(ConsumerState::Polling);
    }

    fn malformed(&mut self, payload: String, error: String) {
        self.stats.malformed += 1;
        self.emit(ConsumerEvent::Malformed { payload, error });
    }

    fn finish(&mut self) -> ConsumerStats {
        let stats = self.stats.clone();
        self.emit(ConsumerEvent::Stopped {
            stats: stats.clone(),
        });
        stats
    }

    fn transition(&mut self, to: ConsumerState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        record_state_transition(&self.span, from.as_str(), to.as_str());
        self.emit(ConsumerEvent::Transition { from, to });
    }

    fn emit(&self, event: ConsumerEvent) {
        self.observer.observe(&event);
    }
}
