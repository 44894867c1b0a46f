//! Prometheus metrics
//!
//! Thin wrappers over the `metrics` facade. Without an installed recorder
//! every call is a no-op.

use std::time::Duration;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Samples persisted (live and backfilled)
    SamplesWritten,
    /// Samples persisted during backfill
    BackfilledSamples,
    /// Failed `current_price` / `historical_range` calls
    SourceErrors,
    /// Failed writes
    PersistenceErrors,
    /// Cooldowns entered after a failed poll
    Backoffs,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Most recent polled price
    LastPrice,
    /// Failed polls since the last success
    ConsecutiveFailures,
}

impl CounterMetric {
    fn name(self) -> &'static str {
        match self {
            CounterMetric::SamplesWritten => "collector_samples_written_total",
            CounterMetric::BackfilledSamples => "collector_backfilled_samples_total",
            CounterMetric::SourceErrors => "collector_source_errors_total",
            CounterMetric::PersistenceErrors => "collector_persistence_errors_total",
            CounterMetric::Backoffs => "collector_backoffs_total",
        }
    }
}

impl GaugeMetric {
    fn name(self) -> &'static str {
        match self {
            GaugeMetric::LastPrice => "collector_last_price_usd",
            GaugeMetric::ConsecutiveFailures => "collector_consecutive_failures",
        }
    }
}

/// Increment a counter, labelled with `label` (e.g., provenance or error kind)
pub fn increment(metric: CounterMetric, label: &str) {
    metrics::counter!(metric.name(), "label" => label.to_string()).increment(1);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, symbol: &str, value: f64) {
    metrics::gauge!(metric.name(), "symbol" => symbol.to_string()).set(value);
}

/// Record how long a source call took
pub fn record_source_latency(provider: &str, duration: Duration) {
    metrics::histogram!(
        "collector_source_latency_ms",
        "provider" => provider.to_string()
    )
    .record(duration.as_secs_f64() * 1000.0);
}
