//! Backfill command implementation

use super::CollectorArgs;
use crate::config::Config;
use crate::engine::{BackfillOutcome, CollectionEngine, EngineConfig};
use crate::source::build_source;
use crate::store::{FileSampleStore, SampleStore};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct BackfillArgs {
    #[command(flatten)]
    pub collector: CollectorArgs,
}

impl BackfillArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let source = build_source(&config.collector)?;
        let store = Arc::new(FileSampleStore::new(&config.storage.output_dir));
        let engine = CollectionEngine::new(
            source,
            store.clone(),
            EngineConfig::from(&config.collector),
        );

        let outcome = engine.backfill().await;
        let stored = store.count(engine.symbol()).await?;

        match outcome {
            BackfillOutcome::Skipped => println!(
                "{}: {} records already in {:?}, backfill skipped",
                engine.symbol(),
                stored,
                store.dir()
            ),
            BackfillOutcome::Completed { fetched, written } => println!(
                "{}: wrote {}/{} historical samples to {:?}",
                engine.symbol(),
                written,
                fetched,
                store.dir()
            ),
            BackfillOutcome::Empty => println!("{}: no historical data available", engine.symbol()),
            BackfillOutcome::Failed => {
                anyhow::bail!("{}: historical fetch failed, see logs", engine.symbol())
            }
        }

        Ok(())
    }
}
