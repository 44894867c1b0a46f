//! Integration tests for price-collector

mod config_test;
mod engine_test;
mod health_test;
mod source_test;
