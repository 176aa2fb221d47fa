//! BriefLens Core Types and Traits
//!
//! This crate provides the fundamental types and traits used throughout BriefLens:
//! - Model registry and backend families
//! - Language support resolution
//! - Provider (invoker) trait abstractions and the invocation error taxonomy
//! - Summarization data model (attempts, metrics, stats, progress)
//! - Settings and platform seams

pub mod error;
pub mod language;
pub mod provider;
pub mod registry;
pub mod settings;
pub mod types;

pub use error::{Error, InvocationError, Result};
pub use language::{LanguageDecision, resolve_language};
pub use provider::{
    DownloadProgressFn, GrantAll, InvocationRequest, OriginAllowList, PermissionGate,
    PlatformCapabilities, Provider,
};
pub use registry::{Family, ModelConfig, ProviderRegistry};
pub use settings::{Settings, SettingsSource};
pub use types::{
    AttemptRecord, ProgressEvent, ProgressStep, ProviderStats, SummarizationMetrics,
};
