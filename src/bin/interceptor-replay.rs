//! Replay recorded chat events against interceptor definitions
//!
//! Reads definitions from a YAML file and events as JSON lines (from a file
//! or stdin), runs them through an engine and prints every hit.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use interceptor_engine::{
    init_tracing, ChatEvent, EngineConfig, InterceptorEngine, InterceptorHit, VERSION,
};
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Interceptor engine event replay
#[derive(Parser, Debug)]
#[command(name = "interceptor-replay")]
#[command(version = VERSION)]
#[command(about = "Replay chat events against interceptor definitions", long_about = None)]
struct Cli {
    /// YAML file holding a list of interceptor definitions
    #[arg(short, long, value_name = "FILE")]
    definitions: PathBuf,

    /// JSON-lines event file; stdin when omitted
    #[arg(value_name = "EVENTS")]
    events: Option<PathBuf>,

    /// Optional engine configuration (YAML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format for hits
    #[arg(short, long, value_enum, default_value = "human")]
    output: OutputFormat,

    /// Seconds to wait for queued events to be matched
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Enable JSON structured logging
    #[arg(long)]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output (one hit per line)
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.json_logs {
        init_tracing();
    } else {
        init_custom_tracing(&cli.log_level);
    }

    let config = match &cli.config {
        Some(path) => {
            let data = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            EngineConfig::from_yaml(&data).context("Invalid engine configuration")?
        }
        None => EngineConfig::default(),
    };

    let data = std::fs::read(&cli.definitions)
        .with_context(|| format!("Failed to read {}", cli.definitions.display()))?;
    let definitions = interceptor_engine::rule::definitions_from_yaml(&data)
        .context("Failed to load definitions")?;

    let engine = InterceptorEngine::new(config).context("Failed to create interceptor engine")?;
    let imported = engine.import_definitions(definitions)?;
    info!("Loaded {} interceptor definitions", imported.len());
    if imported.is_empty() {
        warn!("No definitions loaded; nothing can match");
    }

    let start = Instant::now();
    let (read, skipped) = match &cli.events {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            replay(&engine, BufReader::new(file), cli.timeout)?
        }
        None => replay(&engine, io::stdin().lock(), cli.timeout)?,
    };

    if !engine.wait_idle(Duration::from_secs(cli.timeout)) {
        warn!("Timed out waiting for queued events; output may be incomplete");
    }
    engine.shutdown();

    let mut hits: Vec<InterceptorHit> = engine
        .list_all_definitions()
        .iter()
        .flat_map(|def| engine.list_hits(&def.server_id, &def.id, usize::MAX))
        .collect();
    hits.sort_by(|a, b| a.at.cmp(&b.at));

    let mut out = io::stdout().lock();
    for hit in &hits {
        match cli.output {
            OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(hit)?)?,
            OutputFormat::Human => writeln!(
                out,
                "[{}] {} {} <{}> {}: {} (matched '{}' of {})",
                hit.at.format("%Y-%m-%d %H:%M:%S"),
                hit.server_id,
                hit.channel,
                hit.from_nick,
                hit.event_type,
                hit.text,
                hit.reason,
                hit.interceptor_name
            )?,
        }
    }

    let metrics = engine.metrics();
    if metrics.dropped > 0 {
        warn!(
            dropped = metrics.dropped,
            "Events were dropped by the ingestion queue; raise pipeline.queue_capacity"
        );
    }
    info!(
        read,
        skipped,
        processed = metrics.processed,
        dropped = metrics.dropped,
        hits = metrics.hits,
        "Replayed events in {:?}",
        start.elapsed()
    );

    Ok(())
}

/// Feed every event line to the engine; returns (events read, lines skipped)
///
/// The ingestion queue drops its oldest entry when full, so the replay waits
/// for the worker to catch up whenever the queue reaches capacity.
fn replay(engine: &InterceptorEngine, reader: impl BufRead, timeout: u64) -> Result<(u64, u64)> {
    let capacity = engine.config().pipeline.queue_capacity;
    let mut read = 0;
    let mut skipped = 0;
    for (line_num, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read event line")?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ChatEvent>(&line) {
            Ok(event) => {
                if engine.metrics().queue_depth >= capacity
                    && !engine.wait_idle(Duration::from_secs(timeout))
                {
                    anyhow::bail!("Timed out waiting for the ingestion queue to drain");
                }
                engine.ingest_event(
                    &event.server_id,
                    &event.channel,
                    &event.from_nick,
                    &event.from_hostmask,
                    &event.text,
                    event.event_type,
                );
                read += 1;
            }
            Err(e) => {
                warn!("Skipping line {}: {}", line_num + 1, e);
                skipped += 1;
            }
        }
    }
    Ok((read, skipped))
}

fn init_custom_tracing(level: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}
