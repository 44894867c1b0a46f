//! Sample storage module
//!
//! One record per sample keyed by `<SYMBOL>_<unix-seconds>`. Existence of
//! any record for a symbol is what gates the startup backfill, so no index
//! is kept. A directory scan is fine for a single low-volume instance; a
//! shared or high-throughput deployment wants a keyed table instead.

mod file;
mod memory;

pub use file::FileSampleStore;
pub use memory::MemorySampleStore;

use crate::error::Result;
use crate::sample::PriceSample;
use async_trait::async_trait;

/// Trait for sample store implementations
#[async_trait]
pub trait SampleStore: Send + Sync {
    /// Persist a sample, silently replacing any record with the same key
    ///
    /// Returns a human-readable location of the written record.
    async fn put(&self, sample: &PriceSample) -> Result<String>;

    /// Whether at least one record exists for `symbol`
    async fn has_any(&self, symbol: &str) -> Result<bool>;

    /// Number of records stored for `symbol`
    async fn count(&self, symbol: &str) -> Result<usize>;
}
