//! Integration tests for the liveness server over real sockets

use price_collector::engine::{shutdown_requested, CollectionEngine, EngineConfig};
use price_collector::health::HealthServer;
use price_collector::source::StubSource;
use price_collector::store::MemorySampleStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

async fn get(client: &reqwest::Client, url: &str) -> reqwest::Response {
    // the listener binds asynchronously after spawn
    for _ in 0..50 {
        if let Ok(response) = client.get(url).send().await {
            return response;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server at {} never came up", url);
}

#[tokio::test]
async fn test_server_tracks_engine_readiness() {
    let engine = CollectionEngine::new(
        Arc::new(StubSource::new(100.0)),
        Arc::new(MemorySampleStore::new()),
        EngineConfig::new("ETH"),
    );

    let port = free_port();
    let addr = format!("127.0.0.1:{}", port);
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let server = HealthServer::new("ETH", engine.subscribe(), None);
    let server_addr = addr.clone();
    let handle = tokio::spawn(async move {
        server
            .serve(&server_addr, async move { shutdown_requested(&mut shutdown_rx).await })
            .await
    });

    let client = reqwest::Client::new();
    let base = format!("http://{}", addr);

    let response = get(&client, &format!("{}/health", base)).await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");

    let response = get(&client, &format!("{}/", base)).await;
    assert_eq!(response.text().await.unwrap(), "Crypto Collector running for ETH");

    let response = get(&client, &format!("{}/ready", base)).await;
    assert_eq!(response.status(), 503);

    engine.backfill().await;

    let response = get(&client, &format!("{}/ready", base)).await;
    assert_eq!(response.status(), 200);

    let status: serde_json::Value = get(&client, &format!("{}/status", base))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(status["symbol"], "ETH");
    assert_eq!(status["provider"], "stub");
    assert_eq!(status["backfilled_samples"], 5);
    assert_eq!(status["ready"], true);

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_serve_fails_on_bad_address() {
    let (_tx, rx) = watch::channel(Default::default());
    let server = HealthServer::new("BTC", rx, None);
    let result = server.serve("not-an-address", std::future::pending()).await;
    tokio_test::assert_err!(result);
}
