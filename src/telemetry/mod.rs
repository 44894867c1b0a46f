//! Telemetry module
//!
//! Logging and Prometheus metrics

mod logging;
mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{increment, record_source_latency, set_gauge, CounterMetric, GaugeMetric};

use crate::config::TelemetryConfig;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// How often histogram buckets are compacted
const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Handle to initialized telemetry
pub struct TelemetryGuard {
    metrics: Option<PrometheusHandle>,
}

impl TelemetryGuard {
    /// Prometheus handle when metrics are enabled
    pub fn metrics_handle(&self) -> Option<PrometheusHandle> {
        self.metrics.clone()
    }

    /// Run recorder upkeep on the current runtime until the process exits
    pub fn spawn_upkeep(&self) {
        if let Some(handle) = self.metrics.clone() {
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(UPKEEP_INTERVAL);
                loop {
                    interval.tick().await;
                    handle.run_upkeep();
                }
            });
        }
    }
}

/// Initialize all telemetry subsystems
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    init_logging(&config.log_level, config.log_format)?;

    let metrics = if config.metrics_enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("Failed to install metrics recorder: {}", e))?;
        tracing::debug!("Prometheus recorder installed");
        Some(handle)
    } else {
        None
    };

    Ok(TelemetryGuard { metrics })
}
