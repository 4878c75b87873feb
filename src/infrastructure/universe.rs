//! Universe provider: ranks assets by market cap and applies exclusion
//! filters. Universe selection itself stays an external concern — this
//! crate only needs the interface, not a production market-cap client.
//! Grounded on `check_excluded_coins.py`'s symbol-denylist intent and
//! `domain::ports::MarketDataService`'s trait shape.

use crate::domain::ports::{AssetRef, UniverseProvider};
use anyhow::{Context, Result};
use async_trait::async_trait;

/// A fixed, pre-ranked list of assets — used for offline replay and tests.
/// Applies a case-insensitive symbol denylist (stablecoins, wrapped assets).
pub struct StaticUniverseProvider {
    universe: Vec<AssetRef>,
    excluded: Vec<String>,
}

impl StaticUniverseProvider {
    pub fn new(universe: Vec<AssetRef>, excluded: Vec<String>) -> Self {
        Self { universe, excluded }
    }

    /// Loads a ranked universe from a CSV file (header `symbol,rank,market_cap`).
    pub fn from_csv(path: &std::path::Path, excluded: Vec<String>) -> Result<Self> {
        #[derive(serde::Deserialize)]
        struct Row {
            symbol: String,
            rank: u32,
            market_cap: rust_decimal::Decimal,
        }

        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("opening universe CSV at {}", path.display()))?;
        let universe = reader
            .deserialize::<Row>()
            .filter_map(|r| r.ok())
            .map(|r| AssetRef {
                symbol: r.symbol,
                rank: r.rank,
                market_cap: r.market_cap,
            })
            .collect();
        Ok(Self::new(universe, excluded))
    }

    fn is_excluded(&self, symbol: &str) -> bool {
        self.excluded
            .iter()
            .any(|e| e.eq_ignore_ascii_case(symbol))
    }
}

#[async_trait]
impl UniverseProvider for StaticUniverseProvider {
    async fn ranked_universe(&self, top_n: usize) -> Result<Vec<AssetRef>> {
        let mut ranked: Vec<AssetRef> = self
            .universe
            .iter()
            .filter(|a| !self.is_excluded(&a.symbol))
            .cloned()
            .collect();
        ranked.sort_by_key(|a| a.rank);
        ranked.truncate(top_n);
        Ok(ranked)
    }
}

/// Documents the market-cap API's ranked-list contract without a production
/// CoinMarketCap client — only the interface shape matters here.
pub struct HttpUniverseProvider {
    client: reqwest_middleware::ClientWithMiddleware,
    base_url: String,
    excluded: Vec<String>,
}

impl HttpUniverseProvider {
    pub fn new(base_url: String, excluded: Vec<String>) -> Self {
        Self {
            client: crate::infrastructure::http_client_factory::build_client(5),
            base_url,
            excluded,
        }
    }
}

#[async_trait]
impl UniverseProvider for HttpUniverseProvider {
    async fn ranked_universe(&self, top_n: usize) -> Result<Vec<AssetRef>> {
        #[derive(serde::Deserialize)]
        struct Row {
            symbol: String,
            rank: u32,
            market_cap: rust_decimal::Decimal,
        }

        let url = format!("{}/rankings?limit={top_n}", self.base_url);
        let rows: Vec<Row> = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("fetching ranked universe from {url}"))?
            .json()
            .await
            .context("decoding ranked universe response")?;

        Ok(rows
            .into_iter()
            .filter(|r| !self.excluded.iter().any(|e| e.eq_ignore_ascii_case(&r.symbol)))
            .map(|r| AssetRef {
                symbol: r.symbol,
                rank: r.rank,
                market_cap: r.market_cap,
            })
            .collect())
    }
}
