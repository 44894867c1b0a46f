//! Mean-reverting random-walk price simulator
//!
//! Each step:
//! 1. draws a uniform delta in `[-volatility, volatility]`
//! 2. smooths it into the trend (90% prior trend, 10% new delta)
//! 3. pulls toward the base price (1% of the gap)
//! 4. adds micro-jitter of up to 5% of volatility
//! 5. clamps to `base ± 15%` and rounds to cents

use super::{PriceSource, SymbolMap, DEFAULT_BACKOFF};
use crate::config::SimulatorConfig;
use crate::error::Result;
use crate::sample::PricePoint;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::Mutex;

const TREND_DECAY: f64 = 0.9;
const TREND_WEIGHT: f64 = 0.1;
const MEAN_REVERSION: f64 = 0.01;
const JITTER_FRACTION: f64 = 0.05;
/// Maximum deviation from the base price
const BAND: f64 = 0.15;
/// Smallest base price whose band still holds whole-cent prices
pub const MIN_BASE_PRICE: f64 = 0.07;
/// Default volatility as a fraction of base price
const DEFAULT_VOLATILITY_FRACTION: f64 = 0.002;

/// Reference price used when none is configured
pub fn default_base_price(symbol: &str) -> f64 {
    match symbol.trim().to_uppercase().as_str() {
        "BTC" => 65_000.0,
        "ETH" => 3_500.0,
        "SOL" => 150.0,
        _ => 100.0,
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Random-walk state with its own generator
#[derive(Debug, Clone)]
pub struct RandomWalk {
    base_price: f64,
    current_price: f64,
    volatility: f64,
    trend: f64,
    rng: ChaCha8Rng,
}

impl RandomWalk {
    /// Start a walk at `base_price` driven by `rng`
    pub fn new(base_price: f64, volatility: f64, rng: ChaCha8Rng) -> Self {
        Self {
            base_price,
            current_price: base_price,
            volatility: volatility.abs(),
            trend: 0.0,
            rng,
        }
    }

    /// Deterministic walk for a given seed
    pub fn seeded(base_price: f64, volatility: f64, seed: u64) -> Self {
        Self::new(base_price, volatility, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Walk seeded from OS entropy
    pub fn from_entropy(base_price: f64, volatility: f64) -> Self {
        Self::new(base_price, volatility, ChaCha8Rng::from_entropy())
    }

    /// Inclusive price band `[base * 0.85, base * 1.15]`
    pub fn bounds(&self) -> (f64, f64) {
        (self.base_price * (1.0 - BAND), self.base_price * (1.0 + BAND))
    }

    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    pub fn trend(&self) -> f64 {
        self.trend
    }

    /// Advance one step and return the new price
    pub fn next_price(&mut self) -> f64 {
        let delta = self.rng.gen_range(-1.0..=1.0) * self.volatility;
        self.trend = TREND_DECAY * self.trend + TREND_WEIGHT * delta;

        let reversion = MEAN_REVERSION * (self.base_price - self.current_price);
        let jitter = self.rng.gen_range(-1.0..=1.0) * self.volatility * JITTER_FRACTION;

        let raw = self.current_price + self.trend + reversion + jitter;
        self.current_price = self.clamp_rounded(raw);
        self.current_price
    }

    /// Round to cents while staying inside the band
    ///
    /// A band too narrow to hold a whole cent keeps the unrounded value.
    fn clamp_rounded(&self, value: f64) -> f64 {
        let (low, high) = self.bounds();
        let clamped = value.clamp(low, high);
        let rounded = round_cents(clamped);
        let candidate = if rounded < low {
            (low * 100.0).ceil() / 100.0
        } else if rounded > high {
            (high * 100.0).floor() / 100.0
        } else {
            rounded
        };
        if candidate < low || candidate > high {
            clamped
        } else {
            candidate
        }
    }
}

/// Simulated price source; never fails
pub struct SimulatorSource {
    walk: Mutex<RandomWalk>,
    symbols: SymbolMap,
}

impl SimulatorSource {
    /// Wrap an existing walk
    pub fn new(walk: RandomWalk) -> Self {
        Self {
            walk: Mutex::new(walk),
            symbols: SymbolMap::identity(),
        }
    }

    /// Build a simulator for `symbol`, filling unset parameters from defaults
    pub fn for_symbol(symbol: &str, config: &SimulatorConfig) -> Self {
        let base_price = config
            .base_price
            .unwrap_or_else(|| default_base_price(symbol));
        let volatility = config
            .volatility
            .unwrap_or(base_price * DEFAULT_VOLATILITY_FRACTION);

        let walk = match config.seed {
            Some(seed) => RandomWalk::seeded(base_price, volatility, seed),
            None => RandomWalk::from_entropy(base_price, volatility),
        };

        tracing::info!(
            symbol,
            base_price,
            volatility,
            seeded = config.seed.is_some(),
            "Simulator initialized"
        );

        Self::new(walk)
    }
}

#[async_trait]
impl PriceSource for SimulatorSource {
    fn name(&self) -> &str {
        "simulator"
    }

    fn asset_id(&self, symbol: &str) -> String {
        self.symbols.resolve(symbol)
    }

    async fn current_price(&self, _asset_id: &str) -> Result<f64> {
        let mut walk = self.walk.lock().await;
        Ok(walk.next_price())
    }

    /// One walk step per minute starting at `from`
    async fn historical_range(
        &self,
        _asset_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>> {
        let mut walk = self.walk.lock().await;
        let mut points = Vec::new();
        let mut timestamp = from;
        while timestamp < to {
            points.push(PricePoint::new(walk.next_price(), timestamp));
            timestamp += ChronoDuration::minutes(1);
        }
        Ok(points)
    }

    fn live_tag(&self) -> String {
        "simulated".to_string()
    }

    fn historical_tag(&self) -> String {
        "simulated-historical".to_string()
    }

    fn backoff(&self) -> std::time::Duration {
        DEFAULT_BACKOFF
    }
}
