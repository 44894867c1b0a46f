//! CoinGecko REST price source
//!
//! Current prices come from `/simple/price`, history from
//! `/coins/{id}/market_chart/range`. Asset identifiers are CoinGecko coin
//! ids (`bitcoin`, `ethereum`, ...).

use super::http::{build_client, get_json, validate_price};
use super::{PriceSource, SymbolMap};
use crate::error::{CollectorError, Result};
use crate::sample::PricePoint;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// Configuration for the CoinGecko source
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Cooldown after a failed poll; the free tier rate-limits aggressively
    pub backoff: Duration,
    /// Symbol to coin id table
    pub symbols: SymbolMap,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: COINGECKO_API_URL.to_string(),
            timeout: Duration::from_secs(10),
            backoff: Duration::from_secs(60),
            symbols: SymbolMap::coingecko(),
        }
    }
}

/// `/simple/price` entry: `{"bitcoin": {"usd": 42500.0}}`
#[derive(Debug, Deserialize)]
struct SimpleQuote {
    usd: Option<f64>,
}

/// `/market_chart/range` body; each price is `[unix_ms, price]`
#[derive(Debug, Deserialize)]
struct MarketChart {
    #[serde(default)]
    prices: Vec<(f64, f64)>,
}

/// Price source backed by CoinGecko
pub struct CoinGeckoSource {
    config: CoinGeckoConfig,
    client: Client,
}

impl CoinGeckoSource {
    /// Create a source with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(CoinGeckoConfig::default())
    }

    /// Create a source with custom configuration
    pub fn with_config(config: CoinGeckoConfig) -> Result<Self> {
        let client = build_client(config.timeout)?;
        Ok(Self { config, client })
    }

    /// Point the source at a different base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Pick the USD quote for `coin_id` out of a `/simple/price` body
    fn parse_simple_price(coin_id: &str, body: &HashMap<String, SimpleQuote>) -> Result<f64> {
        let usd = body
            .get(coin_id)
            .and_then(|quote| quote.usd)
            .ok_or_else(|| CollectorError::NotFound(coin_id.to_string()))?;
        validate_price("coingecko", usd)
    }

    /// Convert chart rows to points, dropping rows that do not hold a
    /// valid timestamp and positive price
    fn parse_market_chart(chart: MarketChart) -> Vec<PricePoint> {
        chart
            .prices
            .into_iter()
            .filter_map(|(ms, price)| {
                let timestamp = Utc.timestamp_millis_opt(ms as i64).single()?;
                validate_price("coingecko", price).ok()?;
                Some(PricePoint::new(price, timestamp))
            })
            .collect()
    }
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    fn name(&self) -> &str {
        "coingecko"
    }

    fn asset_id(&self, symbol: &str) -> String {
        self.config.symbols.resolve(symbol)
    }

    async fn current_price(&self, asset_id: &str) -> Result<f64> {
        let url = format!("{}/simple/price", self.config.base_url);
        tracing::debug!(url = %url, asset_id, "Fetching CoinGecko price");

        let request = self
            .client
            .get(&url)
            .query(&[("ids", asset_id), ("vs_currencies", "usd")]);
        let body: HashMap<String, SimpleQuote> = get_json("coingecko", request).await?;

        Self::parse_simple_price(asset_id, &body)
    }

    async fn historical_range(
        &self,
        asset_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>> {
        let url = format!(
            "{}/coins/{}/market_chart/range",
            self.config.base_url, asset_id
        );
        tracing::debug!(url = %url, %from, %to, "Fetching CoinGecko history");

        let request = self.client.get(&url).query(&[
            ("vs_currency", "usd".to_string()),
            ("from", from.timestamp().to_string()),
            ("to", to.timestamp().to_string()),
        ]);
        let chart: MarketChart = get_json("coingecko", request).await?;

        Ok(Self::parse_market_chart(chart))
    }

    fn backoff(&self) -> Duration {
        self.config.backoff
    }
}
