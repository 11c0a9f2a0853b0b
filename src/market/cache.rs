//! Local price cache
//!
//! One JSON file per ticker under the cache directory. Simulation reads only
//! from here; the network is touched only when refreshing.

use super::PriceBar;
use crate::error::EngineError;
use crate::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct PriceCache {
    dir: PathBuf,
}

impl PriceCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file for a ticker
    pub fn path(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.json", ticker))
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.path(ticker).is_file()
    }

    pub async fn save(&self, ticker: &str, bars: &[PriceBar]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path(ticker);
        let bytes = serde_json::to_vec_pretty(bars)?;
        tokio::fs::write(&path, bytes).await?;

        info!(ticker = ticker, bars = bars.len(), path = %path.display(), "Cached price series");
        Ok(())
    }

    pub async fn load(&self, ticker: &str) -> Result<Vec<PriceBar>> {
        let path = self.path(ticker);
        if !path.is_file() {
            return Err(EngineError::DataError(format!(
                "No cached data for {} at {}",
                ticker,
                path.display()
            )));
        }

        let bytes = tokio::fs::read(&path).await?;
        let bars: Vec<PriceBar> = serde_json::from_slice(&bytes)?;

        debug!(ticker = ticker, bars = bars.len(), "Loaded cached price series");
        Ok(bars)
    }
}
