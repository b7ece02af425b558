//! Error types for listq.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("store connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("store operation `{operation}` timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("record cannot be serialized: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("popped entry is not a valid record ({source}): {payload}")]
    Deserialization {
        payload: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the failure is a store-side condition worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
