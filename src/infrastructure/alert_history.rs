//! Alert-history map: the one piece of mutable state the realtime monitor
//! loop carries across ticks, persisted to disk on every update. Grounded
//! on `crypto_realtime_monitor.py`'s `alert_history.json` load/save-on-write
//! pattern, reimplemented with `serde_json` and a single-writer `Mutex`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

/// Keyed by `(symbol, target_level)`, value is the last date a notification
/// was sent for that pair — prevents re-notifying the same target within a
/// single day.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct AlertHistory {
    sent: HashMap<String, NaiveDate>,
}

fn key(symbol: &str, target_level: &str) -> String {
    format!("{symbol}:{target_level}")
}

impl AlertHistory {
    pub fn already_notified(&self, symbol: &str, target_level: &str, today: NaiveDate) -> bool {
        self.sent.get(&key(symbol, target_level)) == Some(&today)
    }

    pub fn record(&mut self, symbol: &str, target_level: &str, today: NaiveDate) {
        self.sent.insert(key(symbol, target_level), today);
    }
}

/// Shared, file-backed alert-history store. Every mutation is followed by a
/// synchronous flush to disk so the monitor survives a restart without
/// re-sending today's alerts.
pub struct AlertHistoryStore {
    path: PathBuf,
    state: Arc<Mutex<AlertHistory>>,
}

impl AlertHistoryStore {
    pub async fn load(path: PathBuf) -> Self {
        let state = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!("alert history at {} is corrupt, starting fresh: {e}", path.display());
                AlertHistory::default()
            }),
            Err(_) => AlertHistory::default(),
        };
        Self {
            path,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub async fn already_notified(&self, symbol: &str, target_level: &str, today: NaiveDate) -> bool {
        self.state.lock().await.already_notified(symbol, target_level, today)
    }

    /// Records the notification and flushes to disk. Persistence failures
    /// are logged, not propagated — a restart at worst re-sends one alert.
    pub async fn record_and_flush(&self, symbol: &str, target_level: &str, today: NaiveDate) {
        let mut guard = self.state.lock().await;
        guard.record(symbol, target_level, today);
        if let Ok(json) = serde_json::to_string_pretty(&*guard) {
            if let Err(e) = write_atomically(&self.path, &json).await {
                warn!("failed to persist alert history to {}: {e}", self.path.display());
            }
        }
    }
}

async fn write_atomically(path: &Path, contents: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await
}
