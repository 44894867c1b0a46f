//! Integration tests for configuration loading and overrides

use price_collector::config::{Config, Provider};
use price_collector::telemetry::LogFormat;
use std::path::PathBuf;

fn example_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config.toml.example")
}

#[test]
fn test_example_config_loads() {
    let mut config = Config::load(example_path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.collector.symbol, "BTC");
    assert_eq!(config.collector.provider, Provider::Coingecko);
    assert_eq!(config.collector.poll_interval_secs, 30);
    assert_eq!(config.collector.backfill_window_secs, 300);
    assert!(config.collector.backoff_secs.is_none());
    assert_eq!(config.storage.output_dir, PathBuf::from("/data/raw"));
    assert_eq!(config.server.addr(), "0.0.0.0:8080");
    assert_eq!(config.telemetry.log_format, LogFormat::Json);
}

#[test]
fn test_environment_overrides_file() {
    let mut config = Config::load(example_path()).unwrap();
    config
        .apply_env(|name| match name {
            "COIN" => Some("sol".to_string()),
            "PROVIDER" => Some("binance".to_string()),
            "DATA_DIR" => Some("/tmp/prices".to_string()),
            "PORT" => Some("9090".to_string()),
            _ => None,
        })
        .unwrap();
    config.validate().unwrap();

    assert_eq!(config.collector.symbol, "SOL");
    assert_eq!(config.collector.provider, Provider::Binance);
    assert_eq!(config.storage.output_dir, PathBuf::from("/tmp/prices"));
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.telemetry.log_level, "info");
}

#[test]
fn test_missing_file_is_error() {
    assert!(Config::load("/nonexistent/price-collector.toml").is_err());
}

#[test]
fn test_rendered_config_reloads() {
    let mut config = Config::default();
    config.collector.backoff_secs = Some(15);
    config.collector.simulator.seed = Some(9);

    let rendered = toml::to_string_pretty(&config).unwrap();
    let reloaded: Config = toml::from_str(&rendered).unwrap();

    assert_eq!(reloaded.collector.backoff_secs, Some(15));
    assert_eq!(reloaded.collector.simulator.seed, Some(9));
    assert_eq!(reloaded.server.port, 8080);
}
