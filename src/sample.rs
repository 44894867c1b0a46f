//! Price sample data model

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// A single price observation, persisted as one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    /// Canonical asset symbol (e.g., "BTC")
    pub symbol: String,
    /// Quote in USD
    pub price: f64,
    /// Time the quote is valid for, second resolution
    pub timestamp: DateTime<Utc>,
    /// Provenance tag (e.g., "binance-api", "coingecko-historical")
    pub source: String,
}

impl PriceSample {
    /// Create a sample, normalizing the symbol to uppercase and truncating
    /// the timestamp to whole seconds
    pub fn new(
        symbol: impl AsRef<str>,
        price: f64,
        timestamp: DateTime<Utc>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.as_ref().trim().to_uppercase(),
            price,
            timestamp: timestamp.trunc_subsecs(0),
            source: source.into(),
        }
    }

    /// Storage key: `<SYMBOL>_<unix-seconds>.json`
    pub fn key(&self) -> String {
        sample_key(&self.symbol, self.timestamp.timestamp())
    }
}

/// A historical `(price, timestamp)` pair returned by a price source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl PricePoint {
    pub fn new(price: f64, timestamp: DateTime<Utc>) -> Self {
        Self { price, timestamp }
    }

    /// Turn this point into a sample for `symbol` tagged with `source`
    pub fn into_sample(self, symbol: &str, source: &str) -> PriceSample {
        PriceSample::new(symbol, self.price, self.timestamp, source)
    }
}

/// Build the deterministic record key for a symbol and unix timestamp
pub fn sample_key(symbol: &str, unix_secs: i64) -> String {
    format!("{}_{}.json", symbol, unix_secs)
}

/// Prefix shared by every record key of `symbol`
pub fn key_prefix(symbol: &str) -> String {
    format!("{}_", symbol)
}
