//! Binance REST price source
//!
//! Current prices come from `/api/v3/ticker/price`, history from 1-minute
//! klines. Asset identifiers are USDT trading pairs (`BTCUSDT`).

use super::http::{build_client, get_json, validate_price};
use super::{PriceSource, SymbolMap};
use crate::error::{CollectorError, Result};
use crate::sample::PricePoint;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Binance REST base URL
pub const BINANCE_API_URL: &str = "https://api.binance.com";

/// Index of the open time in a kline row
const KLINE_OPEN_TIME: usize = 0;
/// Index of the close price in a kline row
const KLINE_CLOSE: usize = 4;

/// Configuration for the Binance source
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Cooldown after a failed poll
    pub backoff: Duration,
    /// Kline interval used for history
    pub kline_interval: String,
    /// Maximum klines per history request
    pub kline_limit: u32,
    /// Symbol to trading pair table
    pub symbols: SymbolMap,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: BINANCE_API_URL.to_string(),
            timeout: Duration::from_secs(10),
            backoff: Duration::from_secs(10),
            kline_interval: "1m".to_string(),
            kline_limit: 500,
            symbols: SymbolMap::binance(),
        }
    }
}

/// Ticker price response
#[derive(Debug, Deserialize)]
struct TickerPrice {
    symbol: String,
    /// Price as a decimal string
    price: String,
}

/// Price source backed by Binance spot
pub struct BinanceSource {
    config: BinanceConfig,
    client: Client,
}

impl BinanceSource {
    /// Create a source with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(BinanceConfig::default())
    }

    /// Create a source with custom configuration
    pub fn with_config(config: BinanceConfig) -> Result<Self> {
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

    /// Validate a ticker response against the requested pair
    fn parse_ticker(pair: &str, ticker: TickerPrice) -> Result<f64> {
        if !ticker.symbol.eq_ignore_ascii_case(pair) {
            return Err(CollectorError::NotFound(pair.to_string()));
        }

        let price: f64 = ticker.price.parse().map_err(|e| {
            CollectorError::Upstream(format!(
                "binance returned unparseable price {:?}: {}",
                ticker.price, e
            ))
        })?;

        validate_price("binance", price)
    }

    /// Convert kline rows to points, skipping malformed rows
    fn parse_klines(rows: Vec<Vec<serde_json::Value>>) -> Vec<PricePoint> {
        rows.into_iter()
            .filter_map(|row| {
                let open_ms = row.get(KLINE_OPEN_TIME).and_then(|v| {
                    v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))
                })?;
                let close: f64 = row.get(KLINE_CLOSE)?.as_str()?.parse().ok()?;
                let price = validate_price("binance", close).ok()?;
                let timestamp = Utc.timestamp_millis_opt(open_ms).single()?;
                Some(PricePoint::new(price, timestamp))
            })
            .collect()
    }
}

#[async_trait]
impl PriceSource for BinanceSource {
    fn name(&self) -> &str {
        "binance"
    }

    fn asset_id(&self, symbol: &str) -> String {
        self.config.symbols.resolve(symbol)
    }

    async fn current_price(&self, asset_id: &str) -> Result<f64> {
        let url = format!("{}/api/v3/ticker/price", self.config.base_url);
        tracing::debug!(url = %url, pair = asset_id, "Fetching Binance price");

        let request = self.client.get(&url).query(&[("symbol", asset_id)]);
        let ticker: TickerPrice = get_json("binance", request).await?;

        Self::parse_ticker(asset_id, ticker)
    }

    async fn historical_range(
        &self,
        asset_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>> {
        let url = format!("{}/api/v3/klines", self.config.base_url);
        tracing::debug!(url = %url, pair = asset_id, %from, %to, "Fetching Binance klines");

        let request = self.client.get(&url).query(&[
            ("symbol", asset_id.to_string()),
            ("interval", self.config.kline_interval.clone()),
            ("startTime", from.timestamp_millis().to_string()),
            ("endTime", to.timestamp_millis().to_string()),
            ("limit", self.config.kline_limit.to_string()),
        ]);
        let rows: Vec<Vec<serde_json::Value>> = get_json("binance", request).await?;

        Ok(Self::parse_klines(rows))
    }

    fn backoff(&self) -> Duration {
        self.config.backoff
    }
}
