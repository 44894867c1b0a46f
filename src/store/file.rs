//! Directory-backed sample store: one pretty-printed JSON file per sample

use super::SampleStore;
use crate::error::{CollectorError, Result};
use crate::sample::{key_prefix, PriceSample};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Writes samples as `<dir>/<SYMBOL>_<unix>.json`
pub struct FileSampleStore {
    dir: PathBuf,
}

impl FileSampleStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path a sample is written to
    pub fn path_for(&self, sample: &PriceSample) -> PathBuf {
        self.dir.join(sample.key())
    }

    /// Create the directory if missing; failures are logged, not returned
    async fn ensure_dir(&self) {
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            tracing::warn!(
                dir = ?self.dir,
                error = %e,
                "Could not create data dir, continuing best-effort"
            );
        }
    }

    /// File names in the directory matching `<SYMBOL>_*.json`
    async fn matching_files(&self, symbol: &str) -> Result<Vec<String>> {
        let prefix = key_prefix(&symbol.trim().to_uppercase());

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CollectorError::persistence(&self.dir, e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CollectorError::persistence(&self.dir, e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(&prefix) && name.ends_with(".json") {
                names.push(name);
            }
        }
        Ok(names)
    }
}

#[async_trait]
impl SampleStore for FileSampleStore {
    async fn put(&self, sample: &PriceSample) -> Result<String> {
        self.ensure_dir().await;

        let path = self.path_for(sample);
        let data = serde_json::to_vec_pretty(sample).map_err(|e| {
            CollectorError::persistence(&path, std::io::Error::new(ErrorKind::InvalidData, e))
        })?;

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| CollectorError::persistence(&path, e))?;

        Ok(path.display().to_string())
    }

    async fn has_any(&self, symbol: &str) -> Result<bool> {
        Ok(!self.matching_files(symbol).await?.is_empty())
    }

    async fn count(&self, symbol: &str) -> Result<usize> {
        Ok(self.matching_files(symbol).await?.len())
    }
}
