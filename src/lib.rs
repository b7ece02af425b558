//! # listq
//!
//! A FIFO work queue on a shared Redis list.
//!
//! Producers [`enqueue`](queue::QueueClient::enqueue) JSON records onto the
//! tail of one list key; consumers pop from the head and hand each record to
//! a [`Sink`](sink::Sink), polling with a linear, capped backoff while the
//! list is empty. Producers and consumers share nothing but the list.

pub mod backoff;
pub mod config;
pub mod consumer;
pub mod error;
pub mod queue;
pub mod shutdown;
pub mod sink;
pub mod store;
pub mod telemetry;

pub use error::{Error, Result};
pub use queue::{QueueClient, Record};
