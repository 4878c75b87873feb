//! Batch replayer: drives the universe provider and candle source across
//! many assets, fanning out per-asset replay in parallel with no shared
//! mutable state. Grounded on `application::optimization::parallel_benchmark`'s
//! use of `rayon` for per-symbol isolated backtests — CPU-bound fan-out
//! across assets, with `tokio` reserved for the I/O-bound orchestration
//! above it.

use crate::domain::ports::{AssetRef, CandleSource, UniverseProvider};
use crate::domain::projector::{self, AlertProjection};
use crate::domain::record::DebugRecordRow;
use crate::domain::replay::replay_asset;
use crate::infrastructure::observability::Metrics;
use anyhow::{Context, Result};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Outcome of replaying one asset: its ordered debug-record rows. Assets
/// whose candle stream is empty are skipped, never fatal to the batch.
pub struct AssetReplayResult {
    pub symbol: String,
    pub rows: Vec<DebugRecordRow>,
}

/// Replays every asset in `universe` against `source`, in parallel. Assets
/// whose candle stream is empty are skipped with a warning; they do not
/// abort the batch. `metrics`, when supplied, records candles folded and
/// events emitted across the whole batch.
pub async fn replay_universe(
    universe: &[AssetRef],
    source: &dyn CandleSource,
    metrics: Option<&Metrics>,
) -> Vec<AssetReplayResult> {
    // Fetch candles (I/O, sequential — the CandleSource trait is async) then
    // fold each asset's pure replay in parallel (CPU-bound, no await points).
    let mut fetched = Vec::with_capacity(universe.len());
    for asset in universe {
        let candles = match source.candles(&asset.symbol).await {
            Ok(candles) => candles,
            Err(e) => {
                warn!("failed to fetch candles for {}: {e}", asset.symbol);
                continue;
            }
        };
        let overrides = source.h_overrides(&asset.symbol).await.unwrap_or(None);
        fetched.push((asset.symbol.clone(), candles, overrides));
    }

    if let Some(metrics) = metrics {
        let total_candles: f64 = fetched.iter().map(|(_, c, _)| c.len() as f64).sum();
        metrics.replay_candles_total.add(total_candles);
    }

    let results: Vec<AssetReplayResult> = fetched
        .into_par_iter()
        .filter_map(|(symbol, candles, overrides)| {
            match replay_asset(&symbol, &candles, overrides.as_ref()) {
                Ok(rows) => Some(AssetReplayResult { symbol, rows }),
                Err(e) => {
                    warn!("skipping {symbol}: {e}");
                    None
                }
            }
        })
        .collect();

    if let Some(metrics) = metrics {
        for result in &results {
            for row in &result.rows {
                let kind = match row.event.as_str() {
                    "" => continue,
                    e if e.starts_with("BUY") => "BUY",
                    e if e.starts_with("ADD") => "ADD",
                    e if e.starts_with("SELL") => "SELL",
                    "RESTART_+98.5pct" => "RESTART",
                    _ => "OTHER",
                };
                metrics.inc_event(kind);
            }
        }
    }

    results
}

/// Writes one debug-record CSV per asset, written once per replay run.
/// Grounded on `application::ml::data_collector`'s use of the `csv` crate
/// for structured output.
pub fn write_debug_records(out_dir: &Path, results: &[AssetReplayResult]) -> Result<()> {
    std::fs::create_dir_all(out_dir).context("creating debug-record output directory")?;
    for result in results {
        let path = out_dir.join(format!("{}.csv", result.symbol));
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("opening debug-record CSV for {}", result.symbol))?;
        for row in &result.rows {
            writer
                .serialize(row)
                .with_context(|| format!("writing debug-record row for {}", result.symbol))?;
        }
        writer.flush().context("flushing debug-record CSV")?;
        info!("wrote {} rows for {}", result.rows.len(), result.symbol);
    }
    Ok(())
}

/// One row of the analysis snapshot, written alongside the debug records.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSnapshotRow {
    pub symbol: String,
    pub rank: u32,
    pub market_cap: Decimal,
    pub next_buy_target: String,
    pub next_buy_price: Option<Decimal>,
    pub distance_pct: Option<Decimal>,
    pub h: Option<Decimal>,
    pub l_now: Option<Decimal>,
}

/// Derives one analysis-snapshot row per asset from its last debug-record
/// row; assets with no rows (empty post-discard streams) are omitted.
pub fn build_analysis_snapshot(
    universe: &[AssetRef],
    results: &[AssetReplayResult],
) -> Vec<AnalysisSnapshotRow> {
    universe
        .iter()
        .filter_map(|asset| {
            let result = results.iter().find(|r| r.symbol == asset.symbol)?;
            let last = result.rows.last()?;
            let AlertProjection {
                next_buy_target,
                next_buy_price,
                distance_pct,
            } = projector::project(last, last.close);
            Some(AnalysisSnapshotRow {
                symbol: asset.symbol.clone(),
                rank: asset.rank,
                market_cap: asset.market_cap,
                next_buy_target,
                next_buy_price,
                distance_pct,
                h: last.h,
                l_now: last.l_now,
            })
        })
        .collect()
}

pub fn write_analysis_snapshot(out_dir: &Path, rows: &[AnalysisSnapshotRow]) -> Result<()> {
    std::fs::create_dir_all(out_dir).context("creating analysis snapshot output directory")?;
    let path = out_dir.join("analysis_snapshot.csv");
    let mut writer =
        csv::Writer::from_path(&path).context("opening analysis snapshot CSV")?;
    for row in rows {
        writer.serialize(row).context("writing analysis snapshot row")?;
    }
    writer.flush().context("flushing analysis snapshot CSV")?;
    Ok(())
}

/// Fetches the universe, up to `top_n` assets, ready for `replay_universe`.
pub async fn load_universe(provider: &dyn UniverseProvider, top_n: usize) -> Result<Vec<AssetRef>> {
    provider.ranked_universe(top_n).await
}
