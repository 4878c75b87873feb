//! Push-based metrics reporter: periodically logs a structured
//! `METRICS_JSON:`-prefixed line, directly grounded on
//! `infrastructure::observability::reporter`. No HTTP server, no incoming
//! connections — only outbound logs.

use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub assets_tracked: usize,
}

pub struct MetricsReporter {
    assets_tracked: usize,
    start_time: Instant,
    interval: Duration,
}

impl MetricsReporter {
    pub fn new(assets_tracked: usize, interval_seconds: u64) -> Self {
        Self {
            assets_tracked,
            start_time: Instant::now(),
            interval: Duration::from_secs(interval_seconds),
        }
    }

    pub async fn run(self) {
        info!(
            "MetricsReporter: starting push-based metrics (interval: {:?})",
            self.interval
        );
        loop {
            tokio::time::sleep(self.interval).await;
            let snapshot = self.collect_snapshot();
            match serde_json::to_string(&snapshot) {
                Ok(json) => println!("METRICS_JSON:{json}"),
                Err(e) => warn!("failed to serialize metrics snapshot: {e}"),
            }
        }
    }

    fn collect_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            assets_tracked: self.assets_tracked,
        }
    }
}
