//! Summarization data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One provider try within a single summarization call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub provider_id: String,
    pub succeeded: bool,
    pub elapsed_millis: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AttemptRecord {
    pub fn success(provider_id: impl Into<String>, elapsed_millis: u64) -> Self {
        Self {
            provider_id: provider_id.into(),
            succeeded: true,
            elapsed_millis,
            error_message: None,
        }
    }

    pub fn failure(
        provider_id: impl Into<String>,
        elapsed_millis: u64,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            succeeded: false,
            elapsed_millis,
            error_message: Some(error_message.into()),
        }
    }
}

/// Attempt trace and timing for one summarization call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummarizationMetrics {
    pub attempts: Vec<AttemptRecord>,
    pub total_elapsed_seconds: f64,
}

impl SummarizationMetrics {
    /// Whether the final attempt in the trace succeeded
    pub fn last_succeeded(&self) -> bool {
        self.attempts.last().is_some_and(|a| a.succeeded)
    }
}

/// Rolling per-provider statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub cumulative_time_seconds: f64,
    pub average_time_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_timestamp: Option<DateTime<Utc>>,
}

impl ProviderStats {
    /// Fold one completed call into the stats
    pub fn record(&mut self, elapsed_seconds: f64, succeeded: bool, at: DateTime<Utc>) {
        self.total_requests = self.total_requests.saturating_add(1);
        self.cumulative_time_seconds += elapsed_seconds.max(0.0);
        self.average_time_seconds = self.cumulative_time_seconds / self.total_requests as f64;
        if succeeded {
            self.successful_requests = self.successful_requests.saturating_add(1);
        }
        self.last_used_timestamp = Some(at);
    }

    /// Success rate (0.0 to 1.0); 0.0 when nothing was recorded
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.successful_requests as f64 / self.total_requests as f64
    }
}

/// Stage a progress event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStep {
    ExtractingContent,
    PrimaryAttempted,
    TryingFallback,
    FallbackSucceeded,
    DownloadingModel,
    Finalizing,
    Complete,
}

/// Transient progress notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub step: ProgressStep,
    pub step_label: String,
    /// 0-100, non-decreasing within one call
    pub percent_complete: u8,
    pub estimated_seconds_remaining: f64,
    pub provider_id: String,
    /// `None` while in progress, otherwise the step's outcome
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub succeeded: Option<bool>,
}
