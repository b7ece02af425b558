//! listq CLI: push records, inspect the queue, run a consumer.

use anyhow::Context;
use clap::{Parser, Subcommand};
use listq::config::Config;
use listq::consumer::Consumer;
use listq::queue::{QueueClient, Record};
use listq::shutdown::shutdown_channel;
use listq::sink::{JsonLinesSink, Sink, StdoutSink};
use listq::store::{RedisStore, connect_with_retry};
use listq::telemetry::{TelemetryConfig, init_telemetry};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

#[derive(Parser)]
#[command(name = "listq", about = "FIFO work queue on a shared Redis list")]
struct Cli {
    /// TOML config file (defaults to LISTQ_* environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enqueue JSON records given as arguments, or one per line on stdin
    Push {
        records: Vec<String>,
    },
    /// Print the number of records waiting in the queue
    Size,
    /// Consume records until interrupted
    Consume {
        /// Append records as JSON lines to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Consume until the queue is empty, then exit
    Drain {
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    let guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "listq".to_string(),
        default_level: config.log_level.clone(),
    })?;

    match cli.command {
        Command::Push { records } => {
            let result = cmd_push(&connect(&config).await?, records).await;
            guard.force_flush();
            result
        }
        Command::Size => {
            println!("{}", connect(&config).await?.size().await?);
            Ok(())
        }
        Command::Consume { output } => cmd_consume(&config, output).await,
        Command::Drain { output } => cmd_drain(connect(&config).await?, &config, output).await,
    }
}

async fn connect(config: &Config) -> anyhow::Result<QueueClient<RedisStore>> {
    let store = RedisStore::connect(&config.store, config.timeout)
        .await
        .context("cannot reach the store")?;
    Ok(QueueClient::new(Arc::new(store), config.queue_key.clone()))
}

async fn cmd_push(queue: &QueueClient<RedisStore>, records: Vec<String>) -> anyhow::Result<()> {
    let lines = if records.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<Result<Vec<_>, _>>()?
    } else {
        records
    };

    let mut pushed = 0usize;
    let mut rejected = 0usize;
    for line in lines.iter().filter(|l| !l.trim().is_empty()) {
        let record: Record = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(e) => {
                warn!(%line, "skipping invalid JSON: {e}");
                rejected += 1;
                continue;
            }
        };
        match queue.enqueue(&record).await {
            Ok(()) => pushed += 1,
            Err(e) if e.is_transient() => return Err(e.into()),
            Err(e) => {
                warn!(%line, "record rejected: {e}");
                rejected += 1;
            }
        }
    }

    println!("Enqueued {pushed} record(s) onto {}", queue.key());
    if rejected > 0 {
        println!("Rejected {rejected} record(s)");
    }
    Ok(())
}

async fn open_sink(output: Option<PathBuf>) -> anyhow::Result<Arc<dyn Sink>> {
    Ok(match output {
        Some(path) => Arc::new(
            JsonLinesSink::open(&path)
                .await
                .with_context(|| format!("cannot open {}", path.display()))?,
        ),
        None => Arc::new(StdoutSink),
    })
}

async fn cmd_consume(config: &Config, output: Option<PathBuf>) -> anyhow::Result<()> {
    let sink = open_sink(output).await?;

    let (stop, mut token) = shutdown_channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => stop.shutdown(),
            Err(e) => warn!("cannot listen for ctrl-c, stop the process another way: {e}"),
        }
    });

    // A store that is down at startup is retried like any other outage.
    let store = connect_with_retry(config.backoff, &mut token, || {
        RedisStore::connect(&config.store, config.timeout)
    })
    .await?;
    let Some(store) = store else {
        return Ok(());
    };

    let queue = QueueClient::new(Arc::new(store), config.queue_key.clone());
    let mut consumer = Consumer::new(queue, sink, config.backoff);
    let stats = consumer.run(token).await;
    eprintln!(
        "processed {} record(s), {} malformed, {} sink failure(s)",
        stats.processed, stats.malformed, stats.sink_failures
    );
    Ok(())
}

async fn cmd_drain(
    queue: QueueClient<RedisStore>,
    config: &Config,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let sink = open_sink(output).await?;
    let mut consumer = Consumer::new(queue, sink, config.backoff);
    let stats = consumer.drain().await?;
    eprintln!(
        "drained {} record(s), {} malformed, {} sink failure(s)",
        stats.processed, stats.malformed, stats.sink_failures
    );
    Ok(())
}
