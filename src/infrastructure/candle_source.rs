//! Candle provider: lazily yields ascending daily candles per asset. Two
//! adapters — a CSV directory (used by the CLI and integration tests) and
//! a thin HTTP stub documenting the exchange collaborator's contract, since
//! candle ingestion itself stays an external concern and only the interface
//! shape matters here. Grounded on `application::ml::data_collector`'s CSV
//! I/O style and `infrastructure::binance`'s HTTP client shape.

use crate::domain::candle::Candle;
use crate::domain::ports::CandleSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

/// Reads `{symbol}.csv` (header `date,open,high,low,close`) from a
/// directory, and an optional sibling `{symbol}.h_override.csv` (header
/// `date,h`) for the daily-H override map.
pub struct CsvCandleSource {
    dir: PathBuf,
}

impl CsvCandleSource {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl CandleSource for CsvCandleSource {
    async fn candles(&self, symbol: &str) -> Result<Vec<Candle>> {
        let path = self.dir.join(format!("{symbol}.csv"));
        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("opening candle CSV for {symbol} at {}", path.display()))?;

        let mut candles = Vec::new();
        for result in reader.deserialize::<Candle>() {
            match result {
                Ok(candle) => candles.push(candle),
                // Malformed row: skip it, replay continues.
                Err(e) => warn!("skipping malformed candle row for {symbol}: {e}"),
            }
        }
        candles.sort_by_key(|c| c.date);
        Ok(candles)
    }

    async fn h_overrides(&self, symbol: &str) -> Result<Option<HashMap<NaiveDate, Decimal>>> {
        let path = self.dir.join(format!("{symbol}.h_override.csv"));
        if !path.exists() {
            return Ok(None);
        }

        #[derive(serde::Deserialize)]
        struct OverrideRow {
            date: NaiveDate,
            h: Decimal,
        }

        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("opening H override CSV for {symbol} at {}", path.display()))?;
        let mut map = HashMap::new();
        for result in reader.deserialize::<OverrideRow>() {
            match result {
                Ok(row) => {
                    map.insert(row.date, row.h);
                }
                // Malformed override entries are ignored.
                Err(e) => warn!("ignoring malformed H override row for {symbol}: {e}"),
            }
        }
        Ok(Some(map))
    }
}

/// Documents the exchange API's candle-fetch contract without implementing
/// a production client — the crate only needs the interface shape to be
/// runnable end-to-end against fixture data.
pub struct HttpCandleSource {
    client: reqwest_middleware::ClientWithMiddleware,
    base_url: String,
}

impl HttpCandleSource {
    pub fn new(base_url: String) -> Self {
        Self {
            client: crate::infrastructure::http_client_factory::build_client(5),
            base_url,
        }
    }
}

#[async_trait]
impl CandleSource for HttpCandleSource {
    async fn candles(&self, symbol: &str) -> Result<Vec<Candle>> {
        let url = format!("{}/candles/{symbol}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("fetching candles for {symbol} from {url}"))?;
        let mut candles: Vec<Candle> = response
            .json()
            .await
            .with_context(|| format!("decoding candle response for {symbol}"))?;
        candles.sort_by_key(|c| c.date);
        Ok(candles)
    }
}
