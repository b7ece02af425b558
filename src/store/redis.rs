//! Redis-backed list store.
//!
//! RPUSH / LPOP / LLEN over a `ConnectionManager`, which multiplexes one
//! socket, reconnects on failure, and is safe to clone across tasks.

use super::ListStore;
use crate::config::StoreConfig;
use crate::config::secrets::ExposeSecret;
use crate::error::{Error, Result};
use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo, RedisResult};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    timeout: Duration,
}

impl RedisStore {
    /// Connect to the configured Redis endpoint. Every later call on this
    /// store, including this one, is bounded by `timeout`.
    pub async fn connect(config: &StoreConfig, timeout: Duration) -> Result<Self> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
            redis: RedisConnectionInfo {
                db: config.db,
                password: config
                    .password
                    .as_ref()
                    .map(|p| p.expose_secret().to_string()),
                ..Default::default()
            },
        };
        let client = ::redis::Client::open(info)?;
        let conn = bounded("connect", timeout, ConnectionManager::new(client)).await?;

        info!(
            host = %config.host,
            port = config.port,
            db = config.db,
            "connected to redis"
        );
        Ok(Self { conn, timeout })
    }

    /// Round-trip a PING.
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = bounded(
            "ping",
            self.timeout,
            ::redis::cmd("PING").query_async(&mut conn),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ListStore for RedisStore {
    async fn push_back(&self, key: &str, value: String) -> Result<u64> {
        let mut conn = self.conn.clone();
        let len: u64 = bounded("rpush", self.timeout, conn.rpush(key, value)).await?;
        debug!(key, len, "rpush");
        Ok(len)
    }

    async fn pop_front(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        bounded("lpop", self.timeout, conn.lpop(key, None)).await
    }

    async fn len(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn.clone();
        bounded("llen", self.timeout, conn.llen(key)).await
    }
}

async fn bounded<T>(
    operation: &'static str,
    timeout: Duration,
    fut: impl Future<Output = RedisResult<T>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(Error::Timeout { operation, timeout }),
    }
}
