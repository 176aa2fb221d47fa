//! Storage trait definitions

use async_trait::async_trait;
use brieflens_core::ProviderStats;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for brieflens_core::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => brieflens_core::Error::Io(e),
            other => brieflens_core::Error::Config(other.to_string()),
        }
    }
}

/// Persistence for the provider id to `ProviderStats` map.
///
/// The map is read and written as a whole.
#[async_trait]
pub trait MetricsStorage: Send + Sync {
    /// Load all stats; an absent store yields an empty map
    async fn load(&self) -> StorageResult<HashMap<String, ProviderStats>>;

    /// Replace all stats
    async fn save(&self, stats: &HashMap<String, ProviderStats>) -> StorageResult<()>;
}
