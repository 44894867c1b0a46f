//! Deterministic wall-clock price stub for smoke tests

use super::{PriceSource, SymbolMap};
use crate::error::Result;
use crate::sample::PricePoint;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::f64::consts::TAU;

/// One full oscillation per hour
const PERIOD_SECS: f64 = 3600.0;
/// Swing of ±1% around the base price
const AMPLITUDE: f64 = 0.01;

/// Price is a pure function of the timestamp; never fails
pub struct StubSource {
    base_price: f64,
    symbols: SymbolMap,
}

impl StubSource {
    pub fn new(base_price: f64) -> Self {
        Self {
            base_price,
            symbols: SymbolMap::identity(),
        }
    }

    /// `base * (1 + 0.01 * sin(2π * t / 3600))`, rounded to cents
    ///
    /// Sub-cent prices are returned unrounded so the result stays positive.
    pub fn price_at(&self, timestamp: DateTime<Utc>) -> f64 {
        let phase = TAU * timestamp.timestamp() as f64 / PERIOD_SECS;
        let price = self.base_price * (1.0 + AMPLITUDE * phase.sin());
        let rounded = (price * 100.0).round() / 100.0;
        if rounded > 0.0 {
            rounded
        } else {
            price
        }
    }
}

#[async_trait]
impl PriceSource for StubSource {
    fn name(&self) -> &str {
        "stub"
    }

    fn asset_id(&self, symbol: &str) -> String {
        self.symbols.resolve(symbol)
    }

    async fn current_price(&self, _asset_id: &str) -> Result<f64> {
        Ok(self.price_at(Utc::now()))
    }

    async fn historical_range(
        &self,
        _asset_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>> {
        let mut points = Vec::new();
        let mut timestamp = from;
        while timestamp < to {
            points.push(PricePoint::new(self.price_at(timestamp), timestamp));
            timestamp += Duration::minutes(1);
        }
        Ok(points)
    }

    fn live_tag(&self) -> String {
        "stub".to_string()
    }
}
