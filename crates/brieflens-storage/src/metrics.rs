//! Rolling per-provider statistics

use crate::atomic_writer::AtomicWriter;
use crate::traits::{MetricsStorage, StorageError, StorageResult};
use async_trait::async_trait;
use brieflens_core::{ProviderStats, SummarizationMetrics};
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Estimate used for providers with no recorded history
pub const DEFAULT_ESTIMATE_SECONDS: f64 = 5.0;

/// Stats map persisted as a single pretty-printed JSON object
pub struct FileMetricsStorage {
    path: PathBuf,
}

impl FileMetricsStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MetricsStorage for FileMetricsStorage {
    async fn load(&self) -> StorageResult<HashMap<String, ProviderStats>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(StorageError::Io(e)),
        };

        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            StorageError::Serialization(format!(
                "Failed to load metrics from {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    async fn save(&self, stats: &HashMap<String, ProviderStats>) -> StorageResult<()> {
        let content = serde_json::to_vec_pretty(stats)
            .map_err(|e| StorageError::Serialization(format!("Failed to serialize metrics: {}", e)))?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || AtomicWriter::replace(&path, &content))
            .await
            .map_err(|e| StorageError::Io(std::io::Error::other(e)))?
    }
}

/// Stats map kept in process memory
#[derive(Default)]
pub struct InMemoryMetricsStorage {
    stats: RwLock<HashMap<String, ProviderStats>>,
}

impl InMemoryMetricsStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetricsStorage for InMemoryMetricsStorage {
    async fn load(&self) -> StorageResult<HashMap<String, ProviderStats>> {
        Ok(self.stats.read().await.clone())
    }

    async fn save(&self, stats: &HashMap<String, ProviderStats>) -> StorageResult<()> {
        *self.stats.write().await = stats.clone();
        Ok(())
    }
}

/// Records one top-level call per provider and serves time estimates.
///
/// Updates are load, modify, save. Writers inside one process are
/// serialized; across processes the last write wins.
#[derive(Clone)]
pub struct MetricsStore {
    storage: Arc<dyn MetricsStorage>,
    write_lock: Arc<Mutex<()>>,
}

impl MetricsStore {
    pub fn new(storage: Arc<dyn MetricsStorage>) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryMetricsStorage::new()))
    }

    /// Fold a finished call into the provider's stats.
    ///
    /// Persistence failures are logged and swallowed.
    pub async fn record_attempt(&self, provider_id: &str, metrics: &SummarizationMetrics) {
        match self.try_record_attempt(provider_id, metrics).await {
            Ok(stats) => debug!(
                provider = provider_id,
                total_requests = stats.total_requests,
                average_time_seconds = stats.average_time_seconds,
                "Provider metrics updated"
            ),
            Err(e) => warn!(provider = provider_id, error = %e, "Failed to persist provider metrics"),
        }
    }

    /// Same as `record_attempt`, returning the updated stats or the failure
    pub async fn try_record_attempt(
        &self,
        provider_id: &str,
        metrics: &SummarizationMetrics,
    ) -> StorageResult<ProviderStats> {
        let _guard = self.write_lock.lock().await;

        let mut all = self.storage.load().await?;
        let stats = all.entry(provider_id.to_string()).or_default();
        stats.record(
            metrics.total_elapsed_seconds,
            metrics.last_succeeded(),
            Utc::now(),
        );
        let updated = stats.clone();

        self.storage.save(&all).await?;
        Ok(updated)
    }

    /// Average duration for the provider, or `DEFAULT_ESTIMATE_SECONDS`
    pub async fn estimate_seconds(&self, provider_id: &str) -> f64 {
        match self.storage.load().await {
            Ok(all) => all
                .get(provider_id)
                .filter(|stats| stats.total_requests > 0)
                .map(|stats| stats.average_time_seconds)
                .unwrap_or(DEFAULT_ESTIMATE_SECONDS),
            Err(e) => {
                warn!(provider = provider_id, error = %e, "Failed to load provider metrics");
                DEFAULT_ESTIMATE_SECONDS
            }
        }
    }

    pub async fn stats(&self, provider_id: &str) -> StorageResult<Option<ProviderStats>> {
        Ok(self.storage.load().await?.remove(provider_id))
    }

    pub async fn snapshot(&self) -> StorageResult<HashMap<String, ProviderStats>> {
        self.storage.load().await
    }

    /// Delete every provider's stats
    pub async fn reset(&self) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        self.storage.save(&HashMap::new()).await
    }
}
