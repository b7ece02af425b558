//! The shared list the queue lives in.
//!
//! A store exposes the three list primitives the queue needs. Each must be
//! atomic on the store side; callers add no locking of their own.

pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

use crate::backoff::{Backoff, BackoffPolicy};
use crate::error::Result;
use crate::shutdown::ShutdownToken;
use async_trait::async_trait;
use std::future::Future;
use tracing::warn;

#[async_trait]
pub trait ListStore: Send + Sync {
    /// Append `value` to the tail of the list at `key`. Returns the new length.
    async fn push_back(&self, key: &str, value: String) -> Result<u64>;

    /// Remove and return the head of the list, or `None` when it is empty.
    async fn pop_front(&self, key: &str) -> Result<Option<String>>;

    /// Number of entries currently in the list.
    async fn len(&self, key: &str) -> Result<u64>;

    async fn is_empty(&self, key: &str) -> Result<bool> {
        Ok(self.len(key).await? == 0)
    }
}

/// Open a store, retrying transient failures under `policy`.
///
/// Returns `Ok(None)` if `shutdown` fires before a connection is made.
/// Non-transient errors (bad configuration) are returned immediately.
pub async fn connect_with_retry<T, F, Fut>(
    policy: BackoffPolicy,
    shutdown: &mut ShutdownToken,
    mut connect: F,
) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut backoff = Backoff::new(policy);
    while !shutdown.is_shutdown() {
        let err = match connect().await {
            Ok(store) => return Ok(Some(store)),
            Err(e) if e.is_transient() => e,
            Err(e) => return Err(e),
        };

        let wait = backoff.next_delay();
        warn!(error = %err, wait_ms = wait.as_millis() as u64, "store unreachable, retrying");
        tokio::select! {
            _ = shutdown.wait() => {}
            _ = tokio::time::sleep(wait) => {}
        }
    }
    Ok(None)
}
