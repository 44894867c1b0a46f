//! Collection engine module
//!
//! Backfills recent history once at startup, then polls the current price
//! on a fixed interval, backing off after source failures.
//!
//! State machine: `Starting -> Backfilling -> Polling <-> Backoff`, ending in
//! `Stopped` only when shutdown is signalled.

mod collector;
mod types;

pub use collector::{shutdown_requested, CollectionEngine};
pub use types::{BackfillOutcome, EngineConfig, EngineState, EngineStatus, TickOutcome};
