//! Canonical symbol to provider asset identifier mapping

use std::collections::HashMap;

/// How to derive an asset identifier for a symbol missing from the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// `DOGE` -> `doge`
    Lowercase,
    /// `DOGE` -> `DOGE`
    Uppercase,
    /// `DOGE` -> `DOGEUSDT` for a suffix of `USDT`
    Pair(&'static str),
}

/// Fixed lookup table plus a fallback rule, one per provider
#[derive(Debug, Clone)]
pub struct SymbolMap {
    table: HashMap<String, String>,
    fallback: Fallback,
}

impl SymbolMap {
    /// Create an empty map with the given fallback
    pub fn new(fallback: Fallback) -> Self {
        Self {
            table: HashMap::new(),
            fallback,
        }
    }

    /// Add or replace an explicit mapping
    pub fn with(mut self, symbol: &str, asset_id: impl Into<String>) -> Self {
        self.table
            .insert(symbol.trim().to_uppercase(), asset_id.into());
        self
    }

    /// CoinGecko coin ids
    pub fn coingecko() -> Self {
        Self::new(Fallback::Lowercase)
            .with("BTC", "bitcoin")
            .with("ETH", "ethereum")
            .with("SOL", "solana")
    }

    /// Binance USDT trading pairs
    pub fn binance() -> Self {
        Self::new(Fallback::Pair("USDT"))
    }

    /// Symbol passes through uppercased
    pub fn identity() -> Self {
        Self::new(Fallback::Uppercase)
    }

    /// Resolve a symbol to an asset identifier, never failing
    pub fn resolve(&self, symbol: &str) -> String {
        let symbol = symbol.trim().to_uppercase();
        if let Some(id) = self.table.get(&symbol) {
            return id.clone();
        }
        match self.fallback {
            Fallback::Lowercase => symbol.to_lowercase(),
            Fallback::Uppercase => symbol,
            Fallback::Pair(suffix) => format!("{}{}", symbol, suffix),
        }
    }

    pub fn fallback(&self) -> Fallback {
        self.fallback
    }
}
