//! Run command implementation

use super::CollectorArgs;
use crate::config::Config;
use crate::engine::{shutdown_requested, CollectionEngine, EngineConfig};
use crate::health::HealthServer;
use crate::source::build_source;
use crate::store::FileSampleStore;
use crate::telemetry::TelemetryGuard;
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub collector: CollectorArgs,

    /// HTTP port for health checks
    #[arg(long)]
    pub port: Option<u16>,
}

impl RunArgs {
    pub fn apply(&self, config: &mut Config) {
        self.collector.apply(config);
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }

    pub async fn execute(&self, config: Config, telemetry: TelemetryGuard) -> anyhow::Result<()> {
        let symbol = config.collector.symbol.clone();

        tracing::info!(
            symbol = %symbol,
            provider = ?config.collector.provider,
            output_dir = ?config.storage.output_dir,
            "Starting collector"
        );

        let source = build_source(&config.collector)?;
        let store = Arc::new(FileSampleStore::new(&config.storage.output_dir));
        let engine = Arc::new(CollectionEngine::new(
            source,
            store,
            EngineConfig::from(&config.collector),
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        telemetry.spawn_upkeep();

        let server = HealthServer::new(&symbol, engine.subscribe(), telemetry.metrics_handle());
        let addr = config.server.addr();
        let mut server_shutdown = shutdown_rx.clone();
        let server_task = tokio::spawn(async move {
            let shutdown = async move { shutdown_requested(&mut server_shutdown).await };
            if let Err(e) = server.serve(&addr, shutdown).await {
                tracing::error!(addr = %addr, error = %e, "Failed to start server");
            }
        });

        let engine_task = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.run(shutdown_rx).await })
        };

        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown requested");
        let _ = shutdown_tx.send(true);

        engine_task.await?;
        server_task.await?;

        let status = engine.status();
        tracing::info!(
            samples_written = status.samples_written,
            source_failures = status.source_failures,
            "Collector stopped"
        );
        Ok(())
    }
}
