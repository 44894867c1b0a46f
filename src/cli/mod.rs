//! CLI interface for price-collector
//!
//! Provides subcommands for:
//! - `run`: Backfill, then poll forever and serve health checks
//! - `backfill`: One-shot backfill into the store
//! - `fetch`: Print the current price without persisting it
//! - `config`: Show the effective configuration

mod backfill;
mod fetch;
mod run;

pub use backfill::BackfillArgs;
pub use fetch::FetchArgs;
pub use run::RunArgs;

use crate::config::{Config, Provider};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "price-collector")]
#[command(about = "Collects a single crypto-asset price into JSON records")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Backfill, then poll forever and serve health checks
    Run(RunArgs),
    /// Backfill recent history once and exit
    Backfill(BackfillArgs),
    /// Print the current price without persisting it
    Fetch(FetchArgs),
    /// Show the effective configuration
    Config,
}

impl Commands {
    /// Apply command-line overrides on top of file and environment config
    pub fn apply(&self, config: &mut Config) {
        match self {
            Commands::Run(args) => args.apply(config),
            Commands::Backfill(args) => args.collector.apply(config),
            Commands::Fetch(args) => args.collector.apply(config),
            Commands::Config => {}
        }
    }
}

/// Overrides shared by every command that talks to a price source
#[derive(Args, Debug, Default)]
pub struct CollectorArgs {
    /// Asset symbol (e.g., BTC)
    #[arg(short, long)]
    pub symbol: Option<String>,

    /// Price source: coingecko, binance, simulator or stub
    #[arg(short, long)]
    pub provider: Option<Provider>,

    /// Directory for sample records
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

impl CollectorArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref symbol) = self.symbol {
            config.collector.symbol = symbol.clone();
        }
        if let Some(provider) = self.provider {
            config.collector.provider = provider;
        }
        if let Some(ref dir) = self.output_dir {
            config.storage.output_dir = dir.clone();
        }
    }
}
