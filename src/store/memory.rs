//! In-memory sample store

use super::SampleStore;
use crate::error::Result;
use crate::sample::{key_prefix, PriceSample};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps samples keyed like [`super::FileSampleStore`], plus the order of
/// writes for inspection
#[derive(Clone, Default)]
pub struct MemorySampleStore {
    records: Arc<RwLock<BTreeMap<String, PriceSample>>>,
    writes: Arc<RwLock<Vec<PriceSample>>>,
}

impl MemorySampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `put` in call order, including overwrites
    pub async fn writes(&self) -> Vec<PriceSample> {
        self.writes.read().await.clone()
    }

    /// Stored records keyed by record key
    pub async fn records(&self) -> BTreeMap<String, PriceSample> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl SampleStore for MemorySampleStore {
    async fn put(&self, sample: &PriceSample) -> Result<String> {
        let key = sample.key();
        self.records.write().await.insert(key.clone(), sample.clone());
        self.writes.write().await.push(sample.clone());
        Ok(format!("memory://{}", key))
    }

    async fn has_any(&self, symbol: &str) -> Result<bool> {
        Ok(self.count(symbol).await? > 0)
    }

    async fn count(&self, symbol: &str) -> Result<usize> {
        let prefix = key_prefix(&symbol.trim().to_uppercase());
        let records = self.records.read().await;
        Ok(records.keys().filter(|k| k.starts_with(&prefix)).count())
    }
}
