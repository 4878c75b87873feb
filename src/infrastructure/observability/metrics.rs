//! Prometheus metrics for the replay/monitor pipeline.
//!
//! All metrics use the `ladder_` prefix and are read-only from the core's
//! perspective — only `application::replay`/`application::monitor` update
//! them. Grounded directly on `infrastructure::observability::metrics`.

use prometheus::{
    CounterVec, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Candles folded across all per-asset replays so far.
    pub replay_candles_total: GenericGauge<AtomicF64>,
    /// BUY/ADD/SELL/RESTART events emitted, labeled by event kind.
    pub events_total: CounterVec,
    /// Wall-clock duration of the most recent monitor tick.
    pub monitor_tick_seconds: HistogramVec,
    /// Notifications attempted, labeled by delivery result.
    pub notifications_total: CounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let replay_candles_total = Gauge::with_opts(Opts::new(
            "ladder_replay_candles_total",
            "Candles folded across all per-asset replays",
        ))?;
        registry.register(Box::new(replay_candles_total.clone()))?;

        let events_total = CounterVec::new(
            Opts::new("ladder_events_total", "Events emitted by the ladder engine"),
            &["event"],
        )?;
        registry.register(Box::new(events_total.clone()))?;

        let monitor_tick_seconds = HistogramVec::new(
            HistogramOpts::new(
                "ladder_monitor_tick_seconds",
                "Wall-clock duration of one monitor-loop tick",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0]),
            &["outcome"],
        )?;
        registry.register(Box::new(monitor_tick_seconds.clone()))?;

        let notifications_total = CounterVec::new(
            Opts::new("ladder_notifications_total", "Notifications attempted"),
            &["result"],
        )?;
        registry.register(Box::new(notifications_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            replay_candles_total,
            events_total,
            monitor_tick_seconds,
            notifications_total,
        })
    }

    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder.encode_to_string(&metric_families).unwrap_or_default()
    }

    pub fn inc_event(&self, event_kind: &str) {
        self.events_total.with_label_values(&[event_kind]).inc();
    }

    pub fn observe_monitor_tick(&self, outcome: &str, seconds: f64) {
        self.monitor_tick_seconds
            .with_label_values(&[outcome])
            .observe(seconds);
    }

    pub fn inc_notification(&self, result: &str) {
        self.notifications_total.with_label_values(&[result]).inc();
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("failed to construct default Metrics registry")
    }
}
