//! Sinks: where dequeued records end up.
//!
//! The consumer loop treats any sink error as non-fatal; it is reported and
//! the loop keeps polling.

use crate::queue::Record;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[async_trait]
pub trait Sink: Send + Sync {
    async fn dispatch(&self, record: Record) -> anyhow::Result<()>;
}

/// Appends each record as one JSON line to a file.
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<tokio::fs::File>,
}

impl JsonLinesSink {
    /// Open `path` for appending, creating it if missing.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Sink for JsonLinesSink {
    async fn dispatch(&self, record: Record) -> anyhow::Result<()> {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Prints each record to stdout.
pub struct StdoutSink;

#[async_trait]
impl Sink for StdoutSink {
    async fn dispatch(&self, record: Record) -> anyhow::Result<()> {
        println!("{record}");
        Ok(())
    }
}
