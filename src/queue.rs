//! Queue client: JSON records over one list key.
//!
//! Producers call [`QueueClient::enqueue`], consumers call
//! [`QueueClient::dequeue`]. An empty queue is `Ok(None)`, never an error.
//! A popped entry that fails to decode is gone for good; the error carries
//! the raw payload so the loss can be reported.

mod finite;

use crate::error::{Error, Result};
use crate::store::ListStore;
use crate::telemetry::metrics;
use opentelemetry::KeyValue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// A record moved through the queue: any JSON document.
pub type Record = serde_json::Value;

pub struct QueueClient<S: ?Sized> {
    store: Arc<S>,
    key: String,
}

impl<S: ?Sized> Clone for QueueClient<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            key: self.key.clone(),
        }
    }
}

impl<S: ListStore + ?Sized> QueueClient<S> {
    pub fn new(store: Arc<S>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Serialize `record` and append it to the tail of the queue.
    pub async fn enqueue<T: Serialize + ?Sized>(&self, record: &T) -> Result<()> {
        let payload = encode(record)?;
        let result = self.store.push_back(&self.key, payload).await;
        self.count("enqueue", &result);
        result.map(|_| ())
    }

    /// Pop the head of the queue and decode it as a [`Record`].
    pub async fn dequeue(&self) -> Result<Option<Record>> {
        self.dequeue_as().await
    }

    /// Pop the head of the queue and decode it as `T`.
    pub async fn dequeue_as<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let popped = self.store.pop_front(&self.key).await;
        let operation = match &popped {
            Ok(None) => "dequeue_empty",
            _ => "dequeue",
        };
        self.count(operation, &popped);

        match popped? {
            Some(payload) => decode(payload).map(Some),
            None => Ok(None),
        }
    }

    /// Number of records not yet consumed.
    pub async fn size(&self) -> Result<u64> {
        let result = self.store.len(&self.key).await;
        self.count("size", &result);
        result
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.size().await? == 0)
    }

    fn count<T>(&self, operation: &'static str, result: &Result<T>) {
        metrics::queue_operations().add(
            1,
            &[
                KeyValue::new("queue", self.key.clone()),
                KeyValue::new("operation", operation),
                KeyValue::new("result", if result.is_ok() { "ok" } else { "error" }),
            ],
        );
    }
}

/// Canonical text encoding of a record.
///
/// Fails on anything JSON cannot represent exactly, including NaN and
/// infinite floats.
pub fn encode<T: Serialize + ?Sized>(record: &T) -> Result<String> {
    record
        .serialize(finite::FiniteCheck)
        .map_err(Error::Serialization)?;
    serde_json::to_string(record).map_err(Error::Serialization)
}

pub fn decode<T: DeserializeOwned>(payload: String) -> Result<T> {
    let parsed = serde_json::from_str::<T>(&payload);
    parsed.map_err(|source| Error::Deserialization { payload, source })
}
