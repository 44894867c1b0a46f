//! Price source module
//!
//! Live API clients (CoinGecko, Binance), a random-walk simulator and a
//! time-based stub, all behind the [`PriceSource`] trait.

mod binance;
mod coingecko;
mod http;
mod simulator;
mod stub;
mod symbols;

pub use binance::{BinanceConfig, BinanceSource, BINANCE_API_URL};
pub use coingecko::{CoinGeckoConfig, CoinGeckoSource, COINGECKO_API_URL};
pub use simulator::{default_base_price, RandomWalk, SimulatorSource, MIN_BASE_PRICE};
pub use stub::StubSource;
pub use symbols::{Fallback, SymbolMap};

use crate::config::{CollectorConfig, Provider};
use crate::error::Result;
use crate::sample::PricePoint;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Cooldown applied after a failed poll when a source has no opinion
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(10);

/// Trait for price source implementations
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Short provider name used in logs and provenance tags
    fn name(&self) -> &str;

    /// Map a canonical symbol (e.g., "BTC") to this provider's asset identifier
    fn asset_id(&self, symbol: &str) -> String;

    /// Fetch the current USD price of `asset_id`
    async fn current_price(&self, asset_id: &str) -> Result<f64>;

    /// Fetch prices between `from` and `to`
    ///
    /// Sources without history return an empty range.
    async fn historical_range(
        &self,
        _asset_id: &str,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>> {
        Ok(Vec::new())
    }

    /// Provenance tag for polled samples
    fn live_tag(&self) -> String {
        format!("{}-api", self.name())
    }

    /// Provenance tag for backfilled samples
    fn historical_tag(&self) -> String {
        format!("{}-historical", self.name())
    }

    /// Cooldown after a failed `current_price` call
    fn backoff(&self) -> Duration {
        DEFAULT_BACKOFF
    }
}

/// Build the configured price source
pub fn build_source(config: &CollectorConfig) -> anyhow::Result<Arc<dyn PriceSource>> {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let source: Arc<dyn PriceSource> = match config.provider {
        Provider::Coingecko => {
            let mut cfg = CoinGeckoConfig {
                timeout,
                ..Default::default()
            };
            if let Some(ref url) = config.base_url {
                cfg.base_url = url.clone();
            }
            if let Some(ref id) = config.asset_id {
                cfg.symbols = cfg.symbols.with(&config.symbol, id);
            }
            Arc::new(CoinGeckoSource::with_config(cfg)?)
        }
        Provider::Binance => {
            let mut cfg = BinanceConfig {
                timeout,
                ..Default::default()
            };
            if let Some(ref url) = config.base_url {
                cfg.base_url = url.clone();
            }
            if let Some(ref id) = config.asset_id {
                cfg.symbols = cfg.symbols.with(&config.symbol, id);
            }
            Arc::new(BinanceSource::with_config(cfg)?)
        }
        Provider::Simulator => Arc::new(SimulatorSource::for_symbol(
            &config.symbol,
            &config.simulator,
        )),
        Provider::Stub => {
            let base = config
                .simulator
                .base_price
                .unwrap_or_else(|| default_base_price(&config.symbol));
            Arc::new(StubSource::new(base))
        }
    };

    tracing::debug!(
        provider = source.name(),
        symbol = %config.symbol,
        asset_id = %source.asset_id(&config.symbol),
        "Built price source"
    );

    Ok(source)
}
