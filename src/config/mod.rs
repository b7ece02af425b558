//! Typed configuration from environment variables or a TOML file.
//!
//! Loads once at startup. Everything has a default except the per-call
//! operation timeout, which must always be stated explicitly.
//! The store password is wrapped in secrecy::SecretString to prevent log leaks.

pub mod secrets;

use crate::backoff::BackoffPolicy;
use crate::error::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_DB: i64 = 0;
pub const DEFAULT_QUEUE_KEY: &str = "listq:items";

/// Where the shared list lives.
#[derive(Debug)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub password: Option<SecretString>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db: DEFAULT_DB,
            password: None,
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub store: StoreConfig,
    pub queue_key: String,
    pub backoff: BackoffPolicy,
    /// Upper bound for every enqueue/dequeue/size round-trip.
    pub timeout: Duration,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let defaults = BackoffPolicy::default();
        let backoff = BackoffPolicy::new(
            Duration::from_millis(parsed_var(
                "LISTQ_BACKOFF_BASE_MS",
                millis(defaults.base),
            )?),
            Duration::from_millis(parsed_var(
                "LISTQ_BACKOFF_STEP_MS",
                millis(defaults.step),
            )?),
            Duration::from_millis(parsed_var("LISTQ_BACKOFF_CAP_MS", millis(defaults.cap))?),
        );

        let config = Self {
            store: StoreConfig {
                host: std::env::var("LISTQ_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
                port: parsed_var("LISTQ_PORT", DEFAULT_PORT)?,
                db: parsed_var("LISTQ_DB", DEFAULT_DB)?,
                password: std::env::var("LISTQ_PASSWORD").ok().map(SecretString::from),
            },
            queue_key: std::env::var("LISTQ_KEY")
                .unwrap_or_else(|_| DEFAULT_QUEUE_KEY.to_string()),
            backoff,
            timeout: Duration::from_millis(required_var("LISTQ_TIMEOUT_MS")?),
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text.
    ///
    /// ```toml
    /// [store]
    /// host = "localhost"
    /// port = 6379
    ///
    /// [queue]
    /// key = "quotes"
    /// timeout_ms = 2000
    ///
    /// [backoff]
    /// cap_ms = 30000
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: FileConfig =
            toml::from_str(content).map_err(|e| Error::Config(format!("bad config: {e}")))?;
        let config = file.into_config()?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.store.port == 0 {
            return Err(Error::Config("store port must be non-zero".to_string()));
        }
        if self.queue_key.trim().is_empty() {
            return Err(Error::Config("queue key must not be empty".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config(
                "operation timeout must be greater than zero".to_string(),
            ));
        }
        if self.backoff.base > self.backoff.cap {
            return Err(Error::Config(format!(
                "backoff base {:?} exceeds cap {:?}",
                self.backoff.base, self.backoff.cap
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default)]
    store: FileStore,
    queue: FileQueue,
    #[serde(default)]
    backoff: FileBackoff,
    #[serde(default)]
    telemetry: FileTelemetry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileStore {
    host: Option<String>,
    port: Option<u16>,
    db: Option<i64>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileQueue {
    key: Option<String>,
    timeout_ms: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileBackoff {
    base_ms: Option<u64>,
    step_ms: Option<u64>,
    cap_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileTelemetry {
    otel_endpoint: Option<String>,
    log_level: Option<String>,
}

impl FileConfig {
    fn into_config(self) -> Result<Config> {
        let defaults = BackoffPolicy::default();
        let ms = |value: Option<u64>, fallback: Duration| {
            value.map(Duration::from_millis).unwrap_or(fallback)
        };

        Ok(Config {
            store: StoreConfig {
                host: self.store.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: self.store.port.unwrap_or(DEFAULT_PORT),
                db: self.store.db.unwrap_or(DEFAULT_DB),
                password: self.store.password.map(SecretString::from),
            },
            queue_key: self
                .queue
                .key
                .unwrap_or_else(|| DEFAULT_QUEUE_KEY.to_string()),
            backoff: BackoffPolicy::new(
                ms(self.backoff.base_ms, defaults.base),
                ms(self.backoff.step_ms, defaults.step),
                ms(self.backoff.cap_ms, defaults.cap),
            ),
            timeout: Duration::from_millis(self.queue.timeout_ms),
            otel_endpoint: self.telemetry.otel_endpoint,
            log_level: self
                .telemetry
                .log_level
                .unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis() as u64
}

fn required_var<T: FromStr>(name: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))?;
    parse_value(name, &raw)
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("invalid value for {name} ({raw:?}): {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_defaults_fill_everything_but_timeout() {
        let config = Config::from_toml_str("[queue]\ntimeout_ms = 1500\n").unwrap();
        assert_eq!(config.store.host, DEFAULT_HOST);
        assert_eq!(config.store.port, DEFAULT_PORT);
        assert_eq!(config.store.db, DEFAULT_DB);
        assert_eq!(config.queue_key, DEFAULT_QUEUE_KEY);
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.backoff, BackoffPolicy::default());
    }

    #[test]
    fn toml_without_timeout_is_rejected() {
        let err = Config::from_toml_str("[queue]\nkey = \"quotes\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got {err:?}");
    }

    #[test]
    fn base_above_cap_is_rejected() {
        let err = Config::from_toml_str(
            "[queue]\ntimeout_ms = 100\n[backoff]\nbase_ms = 5000\ncap_ms = 1000\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("exceeds cap"), "got {err}");
    }
}
