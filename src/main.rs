//! Command-line entry point: replay a universe into debug records, run the
//! realtime monitor loop, or print the alert projection from a previously
//! written debug-record directory.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ladder_engine::application::{monitor, replay};
use ladder_engine::config::Config;
use ladder_engine::domain::ports::Notifier;
use ladder_engine::domain::projector;
use ladder_engine::infrastructure::alert_history::AlertHistoryStore;
use ladder_engine::infrastructure::candle_source::CsvCandleSource;
use ladder_engine::infrastructure::notifier::{LoggingNotifier, WebhookNotifier};
use ladder_engine::infrastructure::observability::Metrics;
use ladder_engine::infrastructure::universe::StaticUniverseProvider;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ladder-engine", about = "Deterministic cycle/ladder trading-signal engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay the full universe against a CSV candle directory, writing one
    /// debug-record CSV per asset plus an analysis snapshot.
    Replay {
        #[arg(long)]
        universe: PathBuf,
        #[arg(long)]
        candles_dir: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 30)]
        top_n: usize,
    },
    /// Run the realtime monitor loop until Ctrl-C.
    Monitor {
        #[arg(long)]
        universe: PathBuf,
        #[arg(long)]
        candles_dir: PathBuf,
        #[arg(long, default_value_t = 300)]
        interval_secs: u64,
        #[arg(long)]
        webhook_url: Option<String>,
        #[arg(long, default_value = "alert_history.json")]
        alert_history_path: PathBuf,
    },
    /// Print the alert projection derived from an already-written
    /// debug-record directory, one line per asset.
    Project {
        #[arg(long)]
        debug_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Replay {
            universe,
            candles_dir,
            out,
            top_n,
        } => run_replay(universe, candles_dir, out, top_n).await,
        Command::Monitor {
            universe,
            candles_dir,
            interval_secs,
            webhook_url,
            alert_history_path,
        } => run_monitor(universe, candles_dir, interval_secs, webhook_url, alert_history_path).await,
        Command::Project { debug_dir } => run_project(debug_dir),
    }
}

async fn run_replay(universe_path: PathBuf, candles_dir: PathBuf, out: PathBuf, top_n: usize) -> Result<()> {
    let provider = StaticUniverseProvider::from_csv(&universe_path, Config::from_env()?.excluded_symbols)
        .with_context(|| format!("loading universe from {}", universe_path.display()))?;
    let universe = replay::load_universe(&provider, top_n).await?;
    info!("replaying {} assets", universe.len());

    let source = CsvCandleSource::new(candles_dir);
    let metrics = Metrics::new()?;
    let results = replay::replay_universe(&universe, &source, Some(&metrics)).await;

    replay::write_debug_records(&out, &results)?;
    let snapshot = replay::build_analysis_snapshot(&universe, &results);
    replay::write_analysis_snapshot(&out, &snapshot)?;

    info!("wrote debug records and analysis snapshot for {} assets to {}", results.len(), out.display());
    tracing::debug!("{}", metrics.render());
    Ok(())
}

async fn run_monitor(
    universe_path: PathBuf,
    candles_dir: PathBuf,
    interval_secs: u64,
    webhook_url: Option<String>,
    alert_history_path: PathBuf,
) -> Result<()> {
    let config = Config::from_env()?;
    let provider = StaticUniverseProvider::from_csv(&universe_path, config.excluded_symbols.clone())
        .with_context(|| format!("loading universe from {}", universe_path.display()))?;
    let source = Arc::new(CsvCandleSource::new(candles_dir));
    let notifier: Arc<dyn Notifier> = match webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url)),
        None => Arc::new(LoggingNotifier),
    };
    let alert_history = Arc::new(AlertHistoryStore::load(alert_history_path).await);
    let metrics = Metrics::new()?;

    monitor::run(
        monitor::MonitorConfig {
            tick_interval: std::time::Duration::from_secs(interval_secs),
            daily_rebuild_hour_utc: config.daily_rebuild_hour_utc,
            top_n: config.top_n,
        },
        Arc::new(provider),
        source,
        notifier,
        alert_history,
        metrics,
    )
    .await
}

fn run_project(debug_dir: PathBuf) -> Result<()> {
    for entry in std::fs::read_dir(&debug_dir)
        .with_context(|| format!("reading debug-record directory {}", debug_dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let symbol = path.file_stem().and_then(|s| s.to_str()).unwrap_or("?").to_string();

        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("opening debug-record CSV at {}", path.display()))?;
        let rows: Vec<ladder_engine::domain::record::DebugRecordRow> = reader
            .deserialize()
            .filter_map(|r| r.ok())
            .collect();
        let Some(last) = rows.last() else { continue };

        let projection = projector::project(last, last.close);
        println!(
            "{symbol}: target={} price={:?} distance_pct={:?}",
            projection.next_buy_target, projection.next_buy_price, projection.distance_pct
        );
    }
    Ok(())
}
