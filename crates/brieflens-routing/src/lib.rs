//! BriefLens Routing Engine
//!
//! This crate provides the orchestration logic for BriefLens:
//! - Fallback planning across backend families
//! - The summarization pipeline with progress reporting
//! - Per-target concurrency guard
//! - Settings-driven network permission gate

pub mod fallback;
pub mod guard;
pub mod invokers;
pub mod permissions;
pub mod pipeline;
pub mod progress;

// Re-export commonly used types
pub use fallback::FallbackPlanner;
pub use guard::{TargetGuard, TargetPermit};
pub use invokers::InvokerSet;
pub use permissions::SettingsPermissionGate;
pub use pipeline::{
    APOLOGY_TEXT, NO_PROVIDER, PipelineConfig, SummarizationPipeline, SummarizeRequest,
    SummaryResult,
};
pub use progress::{
    NoProgress, ProgressReporter, ProgressSink, ProgressStream, progress_channel,
};
