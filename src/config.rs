//! Environment-driven configuration, following the `Config::from_env`
//! convention: every field has a sane default, and invalid values surface
//! via `anyhow::Context` rather than panicking.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub universe_path: PathBuf,
    pub candles_dir: PathBuf,
    pub out_dir: PathBuf,
    pub top_n: usize,
    pub excluded_symbols: Vec<String>,
    pub monitor_interval_secs: u64,
    pub daily_rebuild_hour_utc: u32,
    pub alert_history_path: PathBuf,
    pub notifier_webhook_url: Option<String>,
    pub observability_enabled: bool,
    pub observability_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let universe_path = env::var("LADDER_UNIVERSE_PATH")
            .unwrap_or_else(|_| "universe.csv".to_string())
            .into();

        let candles_dir = env::var("LADDER_CANDLES_DIR")
            .unwrap_or_else(|_| "candles".to_string())
            .into();

        let out_dir = env::var("LADDER_OUT_DIR")
            .unwrap_or_else(|_| "out".to_string())
            .into();

        let top_n = env::var("LADDER_TOP_N")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<usize>()
            .context("failed to parse LADDER_TOP_N")?;

        let excluded_symbols = env::var("LADDER_EXCLUDED_SYMBOLS")
            .unwrap_or_else(|_| "USDT,USDC,DAI,WBTC,WETH".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let monitor_interval_secs = env::var("LADDER_MONITOR_INTERVAL_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse::<u64>()
            .context("failed to parse LADDER_MONITOR_INTERVAL_SECS")?;

        let daily_rebuild_hour_utc = env::var("LADDER_DAILY_REBUILD_HOUR_UTC")
            .unwrap_or_else(|_| "0".to_string())
            .parse::<u32>()
            .context("failed to parse LADDER_DAILY_REBUILD_HOUR_UTC")?;

        let alert_history_path = env::var("LADDER_ALERT_HISTORY_PATH")
            .unwrap_or_else(|_| "alert_history.json".to_string())
            .into();

        let notifier_webhook_url = env::var("LADDER_NOTIFIER_WEBHOOK_URL").ok();

        let observability_enabled = env::var("LADDER_OBSERVABILITY_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let observability_interval_secs = env::var("LADDER_OBSERVABILITY_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<u64>()
            .context("failed to parse LADDER_OBSERVABILITY_INTERVAL_SECS")?;

        Ok(Self {
            universe_path,
            candles_dir,
            out_dir,
            top_n,
            excluded_symbols,
            monitor_interval_secs,
            daily_rebuild_hour_utc,
            alert_history_path,
            notifier_webhook_url,
            observability_enabled,
            observability_interval_secs,
        })
    }
}
