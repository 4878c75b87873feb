//! Collaborator interfaces: the core only needs these traits, not concrete
//! market-cap/exchange/notification clients — those live in
//! `infrastructure`. Mirrors `domain::ports`'s split between trait
//! definitions here and adapters under `infrastructure::`.

use crate::domain::candle::Candle;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// One ranked entry of the replay/monitor universe.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRef {
    pub symbol: String,
    pub rank: u32,
    pub market_cap: Decimal,
}

/// Ranks assets by market cap and applies exclusion filters. Universe
/// selection itself stays an external concern — this crate only needs the
/// interface to drive replay/monitor over a list of symbols.
#[async_trait]
pub trait UniverseProvider: Send + Sync {
    async fn ranked_universe(&self, top_n: usize) -> Result<Vec<AssetRef>>;
}

/// Lazily yields ascending daily candles for one asset, plus an optional
/// per-date H override map. Implementations return candles already sorted
/// ascending; the first candle of the stream is discarded downstream so
/// every source shares the listing-day accommodation in one place.
#[async_trait]
pub trait CandleSource: Send + Sync {
    async fn candles(&self, symbol: &str) -> Result<Vec<Candle>>;

    async fn h_overrides(&self, _symbol: &str) -> Result<Option<HashMap<NaiveDate, Decimal>>> {
        Ok(None)
    }
}

/// Delivers a plain-text alert message. Failures are logged and retried
/// independently; they never block the monitor loop.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<()>;
}
