//! Verdict persistence layer
//!
//! Stores the latest verdict set produced by a simulation run. The JSON file
//! store is what the chat assistant and HTTP service read from.

use crate::models::Verdict;
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Trait for verdict persistence
#[async_trait::async_trait]
pub trait VerdictStore: Send + Sync {
    /// Replace the stored verdict set
    async fn save_all(&self, verdicts: &[Verdict]) -> Result<()>;

    async fn load_all(&self) -> Result<Vec<Verdict>>;

    async fn find(&self, ticker: &str) -> Result<Option<Verdict>> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .find(|v| v.ticker.eq_ignore_ascii_case(ticker)))
    }
}

/// In-memory verdict store for tests and development
pub struct InMemoryVerdictStore {
    verdicts: Arc<RwLock<Vec<Verdict>>>,
}

impl InMemoryVerdictStore {
    pub fn new() -> Self {
        Self {
            verdicts: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryVerdictStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl VerdictStore for InMemoryVerdictStore {
    async fn save_all(&self, verdicts: &[Verdict]) -> Result<()> {
        let mut stored = self.verdicts.write().await;
        *stored = verdicts.to_vec();
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Verdict>> {
        Ok(self.verdicts.read().await.clone())
    }
}

/// Pretty-printed JSON array on disk
pub struct JsonFileVerdictStore {
    path: PathBuf,
}

impl JsonFileVerdictStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl VerdictStore for JsonFileVerdictStore {
    async fn save_all(&self, verdicts: &[Verdict]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(verdicts)?;
        tokio::fs::write(&self.path, json).await?;

        info!(count = verdicts.len(), path = %self.path.display(), "Verdicts saved");
        Ok(())
    }

    /// An absent file reads as no verdicts
    async fn load_all(&self) -> Result<Vec<Verdict>> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }

        let bytes = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
