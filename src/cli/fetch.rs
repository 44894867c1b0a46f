//! Fetch command implementation

use super::CollectorArgs;
use crate::config::Config;
use crate::source::build_source;
use clap::Args;

#[derive(Args, Debug)]
pub struct FetchArgs {
    #[command(flatten)]
    pub collector: CollectorArgs,
}

impl FetchArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let source = build_source(&config.collector)?;
        let symbol = &config.collector.symbol;
        let asset_id = source.asset_id(symbol);

        let price = source.current_price(&asset_id).await?;
        println!(
            "{} ({}) via {}: ${:.2}",
            symbol,
            asset_id,
            source.name(),
            price
        );
        Ok(())
    }
}
