//! Time-bounded cache of finished analyses, keyed by ticker

use crate::error::{DebateError, Result};
use crate::result::AnalysisResult;
use async_trait::async_trait;
use cached::{Cached, TimedCache};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;
use tracing::debug;

/// Store for finished analyses
///
/// Entries older than the TTL are treated as absent. Concurrent writers for
/// the same ticker are last-writer-wins.
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Fresh entry for `ticker`, if any
    async fn get(&self, ticker: &str) -> Result<Option<AnalysisResult>>;

    /// Store `result` under `ticker`
    async fn put(&self, ticker: &str, result: &AnalysisResult) -> Result<()>;
}

/// In-process cache
pub struct MemoryResultCache {
    cache: Arc<RwLock<TimedCache<String, AnalysisResult>>>,
}

impl MemoryResultCache {
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub async fn len(&self) -> usize {
        self.cache.read().await.cache_size()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Clone for MemoryResultCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

#[async_trait]
impl ResultCache for MemoryResultCache {
    async fn get(&self, ticker: &str) -> Result<Option<AnalysisResult>> {
        let mut cache = self.cache.write().await;
        Ok(cache.cache_get(ticker).cloned())
    }

    async fn put(&self, ticker: &str, result: &AnalysisResult) -> Result<()> {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(ticker.to_string(), result.clone());
        Ok(())
    }
}

/// One JSON file per ticker; freshness comes from the file's mtime
///
/// Files survive restarts, so a warm cache directory skips the debate for
/// recently analysed tickers.
#[derive(Debug, Clone)]
pub struct FileResultCache {
    dir: PathBuf,
    ttl: Duration,
}

impl FileResultCache {
    /// Cache rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    /// Directory holding the entries
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{ticker}.json"))
    }
}

#[async_trait]
impl ResultCache for FileResultCache {
    async fn get(&self, ticker: &str) -> Result<Option<AnalysisResult>> {
        let path = self.path_for(ticker);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // A future mtime (clock skew) counts as fresh
        let age = SystemTime::now()
            .duration_since(metadata.modified()?)
            .unwrap_or_default();
        if age >= self.ttl {
            debug!(ticker, age_secs = age.as_secs(), "Cache entry expired");
            return Ok(None);
        }

        let bytes = tokio::fs::read(&path).await?;
        let result = serde_json::from_slice(&bytes)
            .map_err(|e| DebateError::Cache(format!("corrupt entry {}: {e}", path.display())))?;
        Ok(Some(result))
    }

    async fn put(&self, ticker: &str, result: &AnalysisResult) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let bytes = serde_json::to_vec(result)?;
        let tmp = self
            .dir
            .join(format!(".{ticker}.{}.tmp", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, self.path_for(ticker)).await?;

        debug!(ticker, path = %self.path_for(ticker).display(), "Cached analysis");
        Ok(())
    }
}
