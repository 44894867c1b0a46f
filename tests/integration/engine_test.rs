//! Integration tests for the collection engine against real stores

use price_collector::config::{CollectorConfig, Provider};
use price_collector::engine::{BackfillOutcome, CollectionEngine, EngineConfig, EngineState, TickOutcome};
use price_collector::sample::PriceSample;
use price_collector::source::{build_source, StubSource};
use price_collector::store::{FileSampleStore, MemorySampleStore, SampleStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;

fn read_records(dir: &Path) -> Vec<PriceSample> {
    let mut records: Vec<PriceSample> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let content = std::fs::read_to_string(entry.unwrap().path()).unwrap();
            serde_json::from_str(&content).unwrap()
        })
        .collect();
    records.sort_by_key(|r| r.timestamp);
    records
}

fn stub_engine(store: Arc<dyn SampleStore>) -> CollectionEngine {
    CollectionEngine::new(
        Arc::new(StubSource::new(100.0)),
        store,
        EngineConfig::new("btc"),
    )
}

#[tokio::test]
async fn test_backfill_writes_five_minute_history() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileSampleStore::new(dir.path()));
    let engine = stub_engine(store.clone());

    let outcome = engine.backfill().await;
    assert_eq!(outcome, BackfillOutcome::Completed { fetched: 5, written: 5 });
    assert_eq!(store.count("BTC").await.unwrap(), 5);

    let records = read_records(dir.path());
    assert_eq!(records.len(), 5);
    for pair in records.windows(2) {
        assert_eq!((pair[1].timestamp - pair[0].timestamp).num_seconds(), 60);
    }
    for record in &records {
        assert_eq!(record.symbol, "BTC");
        assert_eq!(record.source, "stub-historical");
    }

    let status = engine.status();
    assert!(status.ready);
    assert_eq!(status.backfilled_samples, 5);
}

#[tokio::test]
async fn test_restart_skips_backfill() {
    let dir = TempDir::new().unwrap();

    let first = stub_engine(Arc::new(FileSampleStore::new(dir.path())));
    first.backfill().await;

    let store = Arc::new(FileSampleStore::new(dir.path()));
    let second = stub_engine(store.clone());
    assert_eq!(second.backfill().await, BackfillOutcome::Skipped);
    assert_eq!(store.count("BTC").await.unwrap(), 5);
    assert!(second.status().ready);
}

#[tokio::test]
async fn test_poll_writes_live_record_file() {
    let dir = TempDir::new().unwrap();
    let engine = stub_engine(Arc::new(FileSampleStore::new(dir.path())));

    let location = match engine.poll_once().await {
        TickOutcome::Persisted { location } => location,
        other => panic!("unexpected outcome: {:?}", other),
    };

    let path = Path::new(&location);
    assert!(path.exists());
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("BTC_"));
    assert!(name.ends_with(".json"));

    let record: PriceSample = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(record.source, "stub");
    assert!(record.price >= 99.0 && record.price <= 101.0);
    assert_eq!(record.key(), name);
}

#[tokio::test(start_paused = true)]
async fn test_run_backfills_then_polls_on_interval() {
    let store = MemorySampleStore::new();
    let engine = Arc::new(stub_engine(Arc::new(store.clone())));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.run(shutdown_rx).await })
    };

    // ticks land at 30s and 60s
    tokio::time::sleep(Duration::from_secs(61)).await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    let writes = store.writes().await;
    assert_eq!(writes.len(), 7);
    assert!(writes[..5].iter().all(|s| s.source == "stub-historical"));
    assert!(writes[5..].iter().all(|s| s.source == "stub"));

    let status = engine.status();
    assert_eq!(status.state, EngineState::Stopped);
    assert_eq!(status.ticks, 2);
    assert_eq!(status.samples_written, 7);
    assert_eq!(status.backoffs, 0);
}

#[tokio::test(start_paused = true)]
async fn test_run_with_existing_records_only_polls() {
    let store = MemorySampleStore::new();
    store
        .put(&PriceSample::new("BTC", 1.0, chrono::Utc::now(), "seed"))
        .await
        .unwrap();

    let engine = Arc::new(stub_engine(Arc::new(store.clone())));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.run(shutdown_rx).await })
    };

    tokio::time::sleep(Duration::from_secs(31)).await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    let writes = store.writes().await;
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[1].source, "stub");
    assert_eq!(engine.status().backfilled_samples, 0);
}

#[tokio::test]
async fn test_unknown_symbol_falls_back_to_lowercase_id() {
    let config = CollectorConfig {
        symbol: "DOGE".to_string(),
        provider: Provider::Coingecko,
        ..Default::default()
    };
    let engine = CollectionEngine::new(
        build_source(&config).unwrap(),
        Arc::new(MemorySampleStore::new()),
        EngineConfig::from(&config),
    );

    assert_eq!(engine.asset_id(), "doge");
    let status = engine.status();
    assert_eq!(status.asset_id, "doge");
    assert_eq!(status.provider, "coingecko");
    assert_eq!(engine.backoff(), Duration::from_secs(60));
}

#[tokio::test]
async fn test_simulator_engine_stays_in_band() {
    let mut config = CollectorConfig {
        symbol: "ETH".to_string(),
        provider: Provider::Simulator,
        ..Default::default()
    };
    config.simulator.seed = Some(7);

    let store = MemorySampleStore::new();
    let engine = CollectionEngine::new(
        build_source(&config).unwrap(),
        Arc::new(store.clone()),
        EngineConfig::from(&config),
    );

    for _ in 0..50 {
        assert!(matches!(engine.poll_once().await, TickOutcome::Persisted { .. }));
    }

    let writes = store.writes().await;
    assert_eq!(writes.len(), 50);
    for sample in writes {
        assert_eq!(sample.source, "simulated");
        assert!(sample.price >= 3500.0 * 0.85 && sample.price <= 3500.0 * 1.15);
    }
}
