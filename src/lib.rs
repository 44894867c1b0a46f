//! price-collector: single-asset crypto price collection agent
//!
//! This library provides the core components for:
//! - Price sources (CoinGecko, Binance, a random-walk simulator, a stub)
//! - One-JSON-record-per-sample storage
//! - The collection engine: one-time backfill, then fixed-interval polling
//! - Liveness, readiness and status HTTP endpoints
//! - Logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod health;
pub mod sample;
pub mod source;
pub mod store;
pub mod telemetry;
