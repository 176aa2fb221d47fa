//! BriefLens Storage
//!
//! This crate provides persistence for the summarization pipeline:
//! - Provider metrics (file-backed JSON map, or in memory)
//! - Settings file store (YAML/TOML with environment overrides)

pub mod atomic_writer;
pub mod metrics;
pub mod settings;
pub mod traits;

pub use metrics::{
    DEFAULT_ESTIMATE_SECONDS, FileMetricsStorage, InMemoryMetricsStorage, MetricsStore,
};
pub use settings::FileSettingsStore;
pub use traits::{MetricsStorage, StorageError, StorageResult};
