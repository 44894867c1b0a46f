//! Backfill-then-poll collection loop

use super::types::{BackfillOutcome, EngineConfig, EngineState, EngineStatus, TickOutcome};
use crate::error::CollectorError;
use crate::sample::PriceSample;
use crate::source::PriceSource;
use crate::store::SampleStore;
use crate::telemetry::{self, CounterMetric, GaugeMetric};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

/// Drives one price source into one store for one symbol
///
/// Runs strictly sequentially: a single outstanding source call at a time,
/// backfill writes in oldest-to-newest order, then one write per tick.
pub struct CollectionEngine {
    source: Arc<dyn PriceSource>,
    store: Arc<dyn SampleStore>,
    config: EngineConfig,
    asset_id: String,
    status_tx: watch::Sender<EngineStatus>,
}

impl CollectionEngine {
    /// Create an engine; the asset id is resolved once from the source
    pub fn new(
        source: Arc<dyn PriceSource>,
        store: Arc<dyn SampleStore>,
        config: EngineConfig,
    ) -> Self {
        let asset_id = source.asset_id(&config.symbol);
        let (status_tx, _) = watch::channel(EngineStatus {
            symbol: config.symbol.clone(),
            asset_id: asset_id.clone(),
            provider: source.name().to_string(),
            ..Default::default()
        });

        Self {
            source,
            store,
            config,
            asset_id,
            status_tx,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    /// Cooldown applied after a failed poll
    pub fn backoff(&self) -> Duration {
        self.config.backoff.unwrap_or_else(|| self.source.backoff())
    }

    /// Current status snapshot
    pub fn status(&self) -> EngineStatus {
        self.status_tx.borrow().clone()
    }

    /// Receiver that observes every status update
    pub fn subscribe(&self) -> watch::Receiver<EngineStatus> {
        self.status_tx.subscribe()
    }

    fn update(&self, f: impl FnOnce(&mut EngineStatus)) {
        self.status_tx.send_modify(f);
    }

    fn set_state(&self, state: EngineState) {
        self.update(|s| s.state = state);
    }

    /// Run backfill once, then poll until `shutdown` turns true
    ///
    /// Source and persistence errors never end the loop. An in-flight
    /// source call is allowed to finish before shutdown is observed.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            symbol = %self.config.symbol,
            asset_id = %self.asset_id,
            provider = self.source.name(),
            poll_interval_secs = self.config.poll_interval.as_secs(),
            "Starting collection engine"
        );

        if *shutdown.borrow() {
            self.set_state(EngineState::Stopped);
            return;
        }

        self.backfill().await;

        let period = self.config.poll_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            self.set_state(EngineState::Polling);

            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown_requested(&mut shutdown) => break,
            }

            if !self.poll_once().await.needs_backoff() {
                continue;
            }

            let cooldown = self.backoff();
            self.update(|s| {
                s.state = EngineState::Backoff;
                s.backoffs += 1;
            });
            telemetry::increment(CounterMetric::Backoffs, self.source.name());
            tracing::warn!(
                symbol = %self.config.symbol,
                cooldown_secs = cooldown.as_secs(),
                "Backing off after failed poll"
            );

            tokio::select! {
                _ = tokio::time::sleep(cooldown) => {}
                _ = shutdown_requested(&mut shutdown) => break,
            }
        }

        self.set_state(EngineState::Stopped);
        tracing::info!(symbol = %self.config.symbol, "Collection engine stopped");
    }

    /// Fetch and persist recent history unless the store already holds
    /// records for the symbol
    ///
    /// Best-effort: every failure is logged and the engine is marked ready
    /// regardless of the outcome.
    pub async fn backfill(&self) -> BackfillOutcome {
        self.set_state(EngineState::Backfilling);
        let outcome = self.backfill_inner().await;
        self.update(|s| s.ready = true);
        outcome
    }

    async fn backfill_inner(&self) -> BackfillOutcome {
        let symbol = &self.config.symbol;

        match self.store.has_any(symbol).await {
            Ok(true) => {
                tracing::info!(%symbol, "Historical data already exists, skipping backfill");
                return BackfillOutcome::Skipped;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(
                    %symbol,
                    error = %e,
                    "Could not check store for existing records, attempting backfill"
                );
            }
        }

        let to = Utc::now();
        let window = chrono::Duration::from_std(self.config.backfill_window)
            .unwrap_or_else(|_| chrono::Duration::minutes(5));
        let from = to - window;

        tracing::info!(
            %symbol,
            provider = self.source.name(),
            window_secs = self.config.backfill_window.as_secs(),
            "Backfilling historical data"
        );

        let started = Instant::now();
        let result = self
            .source
            .historical_range(&self.asset_id, from, to)
            .await;
        telemetry::record_source_latency(self.source.name(), started.elapsed());

        let mut points = match result {
            Ok(points) => points,
            Err(e) => {
                self.record_source_failure("historical_range", &e, false);
                tracing::warn!(%symbol, "Could not backfill historical data, continuing to poll");
                return BackfillOutcome::Failed;
            }
        };

        if points.is_empty() {
            tracing::warn!(%symbol, "No historical data received, continuing to poll");
            return BackfillOutcome::Empty;
        }

        points.sort_by_key(|p| p.timestamp);

        let tag = self.source.historical_tag();
        let fetched = points.len();
        let mut written = 0;
        for point in points {
            let sample = point.into_sample(symbol, &tag);
            match self.store.put(&sample).await {
                Ok(_) => {
                    written += 1;
                    self.record_written(&sample, true);
                }
                Err(e) => self.record_persistence_failure(&sample, &e),
            }
        }

        tracing::info!(%symbol, fetched, written, "Backfilled historical data points");
        BackfillOutcome::Completed { fetched, written }
    }

    /// Handle one regular tick: fetch the current price and persist it
    pub async fn poll_once(&self) -> TickOutcome {
        self.update(|s| {
            s.state = EngineState::Polling;
            s.ticks += 1;
        });

        let started = Instant::now();
        let result = self.source.current_price(&self.asset_id).await;
        telemetry::record_source_latency(self.source.name(), started.elapsed());

        let price = match result {
            Ok(price) => price,
            Err(e) => {
                self.record_source_failure("current_price", &e, true);
                return TickOutcome::SourceFailed;
            }
        };

        let sample = PriceSample::new(
            &self.config.symbol,
            price,
            Utc::now(),
            self.source.live_tag(),
        );

        self.update(|s| {
            s.consecutive_failures = 0;
            s.last_price = Some(price);
        });
        telemetry::set_gauge(GaugeMetric::LastPrice, &self.config.symbol, price);
        telemetry::set_gauge(GaugeMetric::ConsecutiveFailures, &self.config.symbol, 0.0);

        match self.store.put(&sample).await {
            Ok(location) => {
                self.record_written(&sample, false);
                tracing::info!(
                    symbol = %sample.symbol,
                    price,
                    path = %location,
                    "Saved price sample"
                );
                TickOutcome::Persisted { location }
            }
            Err(e) => {
                self.record_persistence_failure(&sample, &e);
                TickOutcome::PersistFailed
            }
        }
    }

    fn record_written(&self, sample: &PriceSample, backfilled: bool) {
        self.update(|s| {
            s.samples_written += 1;
            if backfilled {
                s.backfilled_samples += 1;
            }
            s.last_sample_at = Some(sample.timestamp);
        });
        telemetry::increment(CounterMetric::SamplesWritten, &sample.source);
        if backfilled {
            telemetry::increment(CounterMetric::BackfilledSamples, &sample.source);
        }
    }

    fn record_source_failure(&self, operation: &str, error: &CollectorError, polling: bool) {
        let mut consecutive = 0;
        self.update(|s| {
            s.source_failures += 1;
            if polling {
                s.consecutive_failures += 1;
            }
            consecutive = s.consecutive_failures;
        });
        telemetry::increment(CounterMetric::SourceErrors, error.kind());
        if polling {
            telemetry::set_gauge(
                GaugeMetric::ConsecutiveFailures,
                &self.config.symbol,
                consecutive as f64,
            );
        }

        tracing::error!(
            operation,
            symbol = %self.config.symbol,
            asset_id = %self.asset_id,
            provider = self.source.name(),
            kind = error.kind(),
            consecutive_failures = consecutive,
            error = %error,
            "Error fetching price"
        );
    }

    fn record_persistence_failure(&self, sample: &PriceSample, error: &CollectorError) {
        self.update(|s| s.persistence_failures += 1);
        telemetry::increment(CounterMetric::PersistenceErrors, error.kind());
        tracing::error!(
            operation = "put",
            symbol = %sample.symbol,
            key = %sample.key(),
            error = %error,
            "Error writing sample"
        );
    }
}

/// Resolves once shutdown is signalled; never resolves if the sender is gone
pub async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let closed = shutdown.wait_for(|stop| *stop).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
