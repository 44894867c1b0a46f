//! Collection engine types

use crate::config::CollectorConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    #[default]
    Starting,
    Backfilling,
    Polling,
    Backoff,
    Stopped,
}

/// Scheduling parameters for the engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Canonical symbol being collected
    pub symbol: String,
    /// Time between regular ticks
    pub poll_interval: Duration,
    /// How far back the startup backfill reaches
    pub backfill_window: Duration,
    /// Cooldown override; the source's own backoff applies when `None`
    pub backoff: Option<Duration>,
}

impl EngineConfig {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into().trim().to_uppercase(),
            ..Default::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbol: "BTC".to_string(),
            poll_interval: Duration::from_secs(30),
            backfill_window: Duration::from_secs(300),
            backoff: None,
        }
    }
}

impl From<&CollectorConfig> for EngineConfig {
    fn from(config: &CollectorConfig) -> Self {
        Self {
            symbol: config.symbol.trim().to_uppercase(),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            backfill_window: Duration::from_secs(config.backfill_window_secs),
            backoff: config.backoff_secs.map(Duration::from_secs),
        }
    }
}

/// Snapshot of engine progress, published over a watch channel
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineStatus {
    pub symbol: String,
    pub asset_id: String,
    pub provider: String,
    pub state: EngineState,
    /// True once backfill has finished or been skipped
    pub ready: bool,
    /// Regular ticks handled
    pub ticks: u64,
    /// All persisted samples, live and backfilled
    pub samples_written: u64,
    pub backfilled_samples: u64,
    pub source_failures: u64,
    pub persistence_failures: u64,
    pub backoffs: u64,
    pub consecutive_failures: u64,
    pub last_price: Option<f64>,
    pub last_sample_at: Option<DateTime<Utc>>,
}

/// Result of the startup backfill
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackfillOutcome {
    /// Records already existed for the symbol
    Skipped,
    /// History fetched; `written` of `fetched` points persisted
    Completed { fetched: usize, written: usize },
    /// Source returned no points
    Empty,
    /// Source call failed
    Failed,
}

/// Result of one regular tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Sample persisted at `location`
    Persisted { location: String },
    /// Price fetched but the write failed; no backoff
    PersistFailed,
    /// Source call failed; the engine backs off
    SourceFailed,
}

impl TickOutcome {
    pub fn needs_backoff(&self) -> bool {
        matches!(self, TickOutcome::SourceFailed)
    }
}
