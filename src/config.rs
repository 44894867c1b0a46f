//! Configuration types for price-collector
//!
//! Loaded from TOML, then overridden by the deployment environment
//! (`COIN`, `PROVIDER`, `DATA_DIR`, `PORT`, `LOG_LEVEL`).

use crate::source::MIN_BASE_PRICE;
use crate::telemetry::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Price source selection
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Coingecko,
    Binance,
    Simulator,
    Stub,
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coingecko" => Ok(Provider::Coingecko),
            "binance" => Ok(Provider::Binance),
            "simulator" | "sim" => Ok(Provider::Simulator),
            "stub" => Ok(Provider::Stub),
            other => anyhow::bail!("Unknown provider: {}", other),
        }
    }
}

/// Collection engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollectorConfig {
    /// Asset symbol, uppercase
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Which price source to use
    #[serde(default)]
    pub provider: Provider,

    /// Explicit provider asset id, bypassing the symbol table
    #[serde(default)]
    pub asset_id: Option<String>,

    /// Seconds between polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Seconds of history requested at startup
    #[serde(default = "default_backfill_window")]
    pub backfill_window_secs: u64,

    /// Cooldown after a failed poll; defaults to the provider's own value
    #[serde(default)]
    pub backoff_secs: Option<u64>,

    /// Upstream base URL override
    #[serde(default)]
    pub base_url: Option<String>,

    /// HTTP request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub simulator: SimulatorConfig,
}

fn default_symbol() -> String {
    "BTC".to_string()
}
fn default_poll_interval() -> u64 {
    30
}
fn default_backfill_window() -> u64 {
    300 // 5 minutes
}
fn default_request_timeout() -> u64 {
    10
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            provider: Provider::default(),
            asset_id: None,
            poll_interval_secs: default_poll_interval(),
            backfill_window_secs: default_backfill_window(),
            backoff_secs: None,
            base_url: None,
            request_timeout_secs: default_request_timeout(),
            simulator: SimulatorConfig::default(),
        }
    }
}

/// Random-walk simulator parameters
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SimulatorConfig {
    /// Reference price; defaults per symbol
    #[serde(default)]
    pub base_price: Option<f64>,

    /// Step size in USD; defaults to 0.2% of base price
    #[serde(default)]
    pub volatility: Option<f64>,

    /// RNG seed; absent means seeded from entropy
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Sample storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("/data/raw")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

/// Liveness server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Install the Prometheus recorder and serve `/metrics`
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_enabled: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(symbol) = var("COIN").or_else(|| var("COIN_SYMBOL")) {
            self.collector.symbol = symbol;
        }
        if let Some(provider) = var("PROVIDER") {
            self.collector.provider = provider.parse()?;
        }
        if let Some(dir) = var("DATA_DIR") {
            self.storage.output_dir = PathBuf::from(dir);
        }
        if let Some(port) = var("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid PORT {:?}: {}", port, e))?;
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.telemetry.log_level = level;
        }
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_process_env(&mut self) -> anyhow::Result<()> {
        self.apply_env(|name| std::env::var(name).ok())
    }

    /// Normalize and check values that cannot be expressed in the types
    pub fn validate(&mut self) -> anyhow::Result<()> {
        self.collector.symbol = self.collector.symbol.trim().to_uppercase();

        if self.collector.symbol.is_empty() {
            anyhow::bail!("collector.symbol must not be empty");
        }
        // the symbol becomes part of every record file name
        if !self
            .collector
            .symbol
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            anyhow::bail!(
                "collector.symbol must be ASCII letters and digits, got {:?}",
                self.collector.symbol
            );
        }
        if self.collector.poll_interval_secs == 0 {
            anyhow::bail!("collector.poll_interval_secs must be positive");
        }
        if self.collector.backfill_window_secs == 0 {
            anyhow::bail!("collector.backfill_window_secs must be positive");
        }
        if self.collector.request_timeout_secs == 0 {
            anyhow::bail!("collector.request_timeout_secs must be positive");
        }
        if let Some(base) = self.collector.simulator.base_price {
            if !(base.is_finite() && base >= MIN_BASE_PRICE) {
                anyhow::bail!(
                    "collector.simulator.base_price must be at least {}",
                    MIN_BASE_PRICE
                );
            }
        }
        if let Some(vol) = self.collector.simulator.volatility {
            if !(vol.is_finite() && vol >= 0.0) {
                anyhow::bail!("collector.simulator.volatility must not be negative");
            }
        }
        Ok(())
    }
}
