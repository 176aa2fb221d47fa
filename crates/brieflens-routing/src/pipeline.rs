//! Summarization pipeline
//!
//! Runs the preferred model, cascades through the fallback plan on failure,
//! reports progress at fixed milestones and records provider metrics.
//! Every call produces a `SummaryResult`; total failure is a value, not an
//! error.

use crate::{
    fallback::FallbackPlanner,
    invokers::InvokerSet,
    progress::{NoProgress, ProgressReporter, ProgressSink},
};
use brieflens_core::{
    AttemptRecord, Family, InvocationError, InvocationRequest, PlatformCapabilities,
    ProgressStep, Provider, ProviderRegistry, Settings, SettingsSource, SummarizationMetrics,
    resolve_language,
};
use brieflens_storage::MetricsStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{Instrument, debug, info, info_span, warn};

/// Text returned when every provider failed
pub const APOLOGY_TEXT: &str = "Sorry, this page could not be summarized. Every summarization provider failed. Check your API keys and network permissions, then try again.";

/// `used_provider_id` when no provider produced a summary
pub const NO_PROVIDER: &str = "none";

const PERCENT_EXTRACTING: u8 = 10;
const PERCENT_PRIMARY_SUCCEEDED: u8 = 70;
const PERCENT_PRIMARY_FAILED: u8 = 20;
const PERCENT_FALLBACK_SUCCEEDED: u8 = 90;
const PERCENT_FINALIZING: u8 = 95;
const PERCENT_COMPLETE: u8 = 100;

#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Deadline for a single provider attempt. `None` waits indefinitely.
    pub attempt_timeout: Option<Duration>,
}

impl PipelineConfig {
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone)]
pub struct SummarizeRequest {
    pub content: String,
    /// Overrides the stored default model
    pub forced_model_id: Option<String>,
    /// Overrides the stored fallback setting
    pub fallback_enabled: Option<bool>,
}

impl SummarizeRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            forced_model_id: None,
            fallback_enabled: None,
        }
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.forced_model_id = Some(model_id.into());
        self
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_enabled = Some(enabled);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryResult {
    pub summary_text: String,
    /// Model that produced the summary, or `NO_PROVIDER`
    pub used_provider_id: String,
    /// Model whose stats recorded this call: the producer, or the
    /// preferred model when everything failed
    pub attributed_provider_id: String,
    /// Wall time for the whole call, rounded to two decimals
    pub elapsed_seconds: f64,
    pub metrics: SummarizationMetrics,
}

impl SummaryResult {
    pub fn is_success(&self) -> bool {
        self.used_provider_id != NO_PROVIDER
    }
}

pub struct SummarizationPipeline {
    invokers: InvokerSet,
    capabilities: Arc<dyn PlatformCapabilities>,
    settings: Arc<dyn SettingsSource>,
    metrics: MetricsStore,
    config: PipelineConfig,
}

impl SummarizationPipeline {
    pub fn new(
        invokers: InvokerSet,
        capabilities: Arc<dyn PlatformCapabilities>,
        settings: Arc<dyn SettingsSource>,
        metrics: MetricsStore,
    ) -> Self {
        Self {
            invokers,
            capabilities,
            settings,
            metrics,
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn metrics(&self) -> &MetricsStore {
        &self.metrics
    }

    /// Summarize without progress reporting
    pub async fn summarize_quietly(&self, request: SummarizeRequest) -> SummaryResult {
        self.summarize(request, NoProgress).await
    }

    pub async fn summarize<S>(&self, request: SummarizeRequest, progress: S) -> SummaryResult
    where
        S: ProgressSink + 'static,
    {
        let span = info_span!("summarize", request_id = %uuid::Uuid::new_v4());
        self.run(request, Arc::new(progress)).instrument(span).await
    }

    async fn run(&self, request: SummarizeRequest, sink: Arc<dyn ProgressSink>) -> SummaryResult {
        let started = Instant::now();
        let reporter = Arc::new(ProgressReporter::new(sink));

        let settings = match self.settings.load().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            }
        };

        let preferred = request
            .forced_model_id
            .clone()
            .or_else(|| settings.default_model.clone())
            .unwrap_or_else(|| ProviderRegistry::default_model_id().to_string());
        let fallback_enabled = request.fallback_enabled.unwrap_or(settings.fallback_enabled);

        reporter.set_provider(&preferred, self.metrics.estimate_seconds(&preferred).await);
        reporter.emit(
            ProgressStep::ExtractingContent,
            "Extracting page content",
            PERCENT_EXTRACTING,
            None,
        );

        info!(
            preferred = %preferred,
            fallback_enabled,
            content_chars = request.content.chars().count(),
            "Starting summarization"
        );

        let mut attempts = Vec::new();
        let mut produced: Option<(String, String)> = None;

        let (record, summary) = self
            .attempt(&preferred, &request.content, &settings, &reporter)
            .await;
        let primary_succeeded = record.succeeded;
        attempts.push(record);
        if let Some(text) = summary {
            produced = Some((preferred.clone(), text));
        }

        reporter.emit(
            ProgressStep::PrimaryAttempted,
            if primary_succeeded {
                format!("Summarized with {}", display_name(&preferred))
            } else {
                format!("{} failed", display_name(&preferred))
            },
            if primary_succeeded {
                PERCENT_PRIMARY_SUCCEEDED
            } else {
                PERCENT_PRIMARY_FAILED
            },
            Some(primary_succeeded),
        );

        if produced.is_none() && fallback_enabled {
            let candidates = FallbackPlanner::plan(&preferred, self.local_supported());
            debug!(primary = %preferred, candidates = ?candidates, "Fallback plan");

            let total = candidates.len();
            for (index, candidate) in candidates.into_iter().enumerate() {
                let percent = fallback_percent(index, total);
                reporter.set_provider(candidate, self.metrics.estimate_seconds(candidate).await);
                reporter.emit(
                    ProgressStep::TryingFallback,
                    format!("Trying {}", display_name(candidate)),
                    percent,
                    None,
                );

                let (record, summary) = self
                    .attempt(candidate, &request.content, &settings, &reporter)
                    .await;
                attempts.push(record);

                match summary {
                    Some(text) => {
                        info!(fallback = candidate, "Fallback provider succeeded");
                        reporter.emit(
                            ProgressStep::FallbackSucceeded,
                            format!("Summarized with {}", display_name(candidate)),
                            PERCENT_FALLBACK_SUCCEEDED,
                            Some(true),
                        );
                        produced = Some((candidate.to_string(), text));
                        break;
                    }
                    None => {
                        reporter.emit(
                            ProgressStep::TryingFallback,
                            format!("{} failed", display_name(candidate)),
                            percent,
                            Some(false),
                        );
                    }
                }
            }
        }

        reporter.emit(ProgressStep::Finalizing, "Finalizing", PERCENT_FINALIZING, None);

        let elapsed_seconds = round_to_hundredths(started.elapsed().as_secs_f64());
        let metrics = SummarizationMetrics {
            attempts,
            total_elapsed_seconds: elapsed_seconds,
        };

        let (summary_text, used_provider_id, attributed_provider_id) = match produced {
            Some((provider_id, text)) => (text, provider_id.clone(), provider_id),
            None => {
                warn!(
                    preferred = %preferred,
                    attempts = metrics.attempts.len(),
                    "All providers failed"
                );
                (APOLOGY_TEXT.to_string(), NO_PROVIDER.to_string(), preferred.clone())
            }
        };

        self.metrics
            .record_attempt(&attributed_provider_id, &metrics)
            .await;

        let succeeded = used_provider_id != NO_PROVIDER;
        reporter.emit(
            ProgressStep::Complete,
            if succeeded { "Complete" } else { "Failed" },
            PERCENT_COMPLETE,
            Some(succeeded),
        );

        info!(
            provider = %used_provider_id,
            attempts = metrics.attempts.len(),
            elapsed_seconds,
            "Summarization finished"
        );

        SummaryResult {
            summary_text,
            used_provider_id,
            attributed_provider_id,
            elapsed_seconds,
            metrics,
        }
    }

    fn local_supported(&self) -> bool {
        self.capabilities.supports_on_device_summarization() && self.invokers.contains(Family::Local)
    }

    /// One provider try, always producing a record
    async fn attempt(
        &self,
        model_id: &str,
        content: &str,
        settings: &Settings,
        reporter: &Arc<ProgressReporter>,
    ) -> (AttemptRecord, Option<String>) {
        let started = Instant::now();
        let outcome = self.invoke_model(model_id, content, settings, reporter).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(summary) => {
                info!(provider = model_id, elapsed_ms, "Provider attempt succeeded");
                (AttemptRecord::success(model_id, elapsed_ms), Some(summary))
            }
            Err(err) => {
                warn!(
                    provider = model_id,
                    elapsed_ms,
                    preflight = err.is_preflight(),
                    error = %err,
                    "Provider attempt failed"
                );
                (
                    AttemptRecord::failure(model_id, elapsed_ms, err.to_string()),
                    None,
                )
            }
        }
    }

    async fn invoke_model(
        &self,
        model_id: &str,
        content: &str,
        settings: &Settings,
        reporter: &Arc<ProgressReporter>,
    ) -> Result<String, InvocationError> {
        let model = ProviderRegistry::lookup(model_id).ok_or_else(|| {
            InvocationError::Configuration(format!("Unknown model id '{}'", model_id))
        })?;
        let invoker = self.invokers.get(model.family).ok_or_else(|| {
            InvocationError::Configuration(format!(
                "No invoker registered for family '{}'",
                model.family
            ))
        })?;

        let language = resolve_language(Some(model.family), settings.language.as_deref());
        if language.needs_fallback {
            debug!(
                family = %model.family,
                requested = ?settings.language,
                effective = %language.effective_language,
                "Requested language not supported, using English"
            );
        }

        let mut request = InvocationRequest::new(content, language.effective_language);
        if let Some(wire_model_id) = model.wire_model_id {
            request = request.with_wire_model_id(wire_model_id);
        }
        if let Some(key) = settings.credential(model.family) {
            request = request.with_credential(key);
        }
        if model.family == Family::Local {
            request = request.with_download_progress(reporter.download_callback());
        }

        match self.config.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, invoker.invoke(request))
                .await
                .unwrap_or_else(|_| {
                    Err(InvocationError::Transport(format!(
                        "attempt timed out after {:.1}s",
                        limit.as_secs_f64()
                    )))
                }),
            None => invoker.invoke(request).await,
        }
    }
}

fn display_name(model_id: &str) -> &str {
    ProviderRegistry::lookup(model_id)
        .map(|model| model.display_name)
        .unwrap_or(model_id)
}

/// Pre-attempt percentage for fallback candidate `index` of `total`,
/// spread evenly between the primary-failed and fallback-succeeded marks
fn fallback_percent(index: usize, total: usize) -> u8 {
    let span = usize::from(PERCENT_FALLBACK_SUCCEEDED - PERCENT_PRIMARY_FAILED - 10);
    let step = span * (index + 1) / (total + 1);
    PERCENT_PRIMARY_FAILED + step.min(span) as u8
}

fn round_to_hundredths(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}
