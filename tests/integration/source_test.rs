//! End-to-end tests for live sources against mocked upstream APIs

use price_collector::config::{CollectorConfig, Provider};
use price_collector::engine::{BackfillOutcome, CollectionEngine, EngineConfig, TickOutcome};
use price_collector::source::build_source;
use price_collector::store::MemorySampleStore;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine_for(
    provider: Provider,
    symbol: &str,
    base_url: &str,
    store: &MemorySampleStore,
) -> CollectionEngine {
    let config = CollectorConfig {
        symbol: symbol.to_string(),
        provider,
        base_url: Some(base_url.to_string()),
        request_timeout_secs: 2,
        ..Default::default()
    };
    CollectionEngine::new(
        build_source(&config).unwrap(),
        Arc::new(store.clone()),
        EngineConfig::from(&config),
    )
}

#[tokio::test]
async fn test_coingecko_backfill_and_poll() {
    let server = MockServer::start().await;

    // out of order on purpose
    Mock::given(method("GET"))
        .and(path("/coins/bitcoin/market_chart/range"))
        .and(query_param("vs_currency", "usd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "prices": [
                [1704067320000.0, 42520.0],
                [1704067200000.0, 42500.0],
                [1704067260000.0, 42510.0]
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .and(query_param("ids", "bitcoin"))
        .and(query_param("vs_currencies", "usd"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"bitcoin": {"usd": 42600.25}})),
        )
        .mount(&server)
        .await;

    let store = MemorySampleStore::new();
    let engine = engine_for(Provider::Coingecko, "btc", &server.uri(), &store);

    assert_eq!(
        engine.backfill().await,
        BackfillOutcome::Completed { fetched: 3, written: 3 }
    );
    assert!(matches!(engine.poll_once().await, TickOutcome::Persisted { .. }));

    let writes = store.writes().await;
    assert_eq!(writes.len(), 4);
    let prices: Vec<f64> = writes.iter().map(|s| s.price).collect();
    assert_eq!(prices, vec![42500.0, 42510.0, 42520.0, 42600.25]);
    assert!(writes[..3].iter().all(|s| s.source == "coingecko-historical"));
    assert_eq!(writes[3].source, "coingecko-api");
    assert_eq!(writes[0].key(), "BTC_1704067200.json");
}

#[tokio::test]
async fn test_binance_backfill_and_poll() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .and(query_param("symbol", "ETHUSDT"))
        .and(query_param("interval", "1m"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            [1704067200000u64, "2300.0", "2310.0", "2290.0", "2305.5", "10.0"],
            ["garbage"],
            [1704067260000u64, "2305.5", "2312.0", "2301.0", "2308.25", "8.0"]
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v3/ticker/price"))
        .and(query_param("symbol", "ETHUSDT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "symbol": "ETHUSDT",
            "price": "2310.10000000"
        })))
        .mount(&server)
        .await;

    let store = MemorySampleStore::new();
    let engine = engine_for(Provider::Binance, "ETH", &server.uri(), &store);
    assert_eq!(engine.asset_id(), "ETHUSDT");

    assert_eq!(
        engine.backfill().await,
        BackfillOutcome::Completed { fetched: 2, written: 2 }
    );
    assert!(matches!(engine.poll_once().await, TickOutcome::Persisted { .. }));

    let writes = store.writes().await;
    assert_eq!(writes.len(), 3);
    assert_eq!(writes[0].price, 2305.5);
    assert_eq!(writes[1].price, 2308.25);
    assert_eq!(writes[2].price, 2310.1);
    assert_eq!(writes[1].source, "binance-historical");
    assert_eq!(writes[2].source, "binance-api");
    assert_eq!(writes[2].symbol, "ETH");
}

#[tokio::test]
async fn test_rate_limited_poll_is_source_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .expect(2)
        .mount(&server)
        .await;

    let store = MemorySampleStore::new();
    let engine = engine_for(Provider::Coingecko, "BTC", &server.uri(), &store);

    assert_eq!(engine.poll_once().await, TickOutcome::SourceFailed);
    assert_eq!(engine.poll_once().await, TickOutcome::SourceFailed);

    let status = engine.status();
    assert_eq!(status.source_failures, 2);
    assert_eq!(status.consecutive_failures, 2);
    assert!(store.writes().await.is_empty());
    assert_eq!(engine.backoff(), Duration::from_secs(60));
}

#[tokio::test]
async fn test_failed_history_still_marks_ready() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = MemorySampleStore::new();
    let engine = engine_for(Provider::Binance, "BTC", &server.uri(), &store);

    assert_eq!(engine.backfill().await, BackfillOutcome::Failed);
    let status = engine.status();
    assert!(status.ready);
    assert_eq!(status.consecutive_failures, 0);
    assert!(store.writes().await.is_empty());
}

#[tokio::test]
async fn test_configured_backoff_overrides_provider() {
    let config = CollectorConfig {
        provider: Provider::Binance,
        backoff_secs: Some(5),
        ..Default::default()
    };
    let engine = CollectionEngine::new(
        build_source(&config).unwrap(),
        Arc::new(MemorySampleStore::new()),
        EngineConfig::from(&config),
    );
    assert_eq!(engine.backoff(), Duration::from_secs(5));
}
