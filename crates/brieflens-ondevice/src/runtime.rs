//! Platform primitives for on-device summarization and translation

use async_trait::async_trait;
use brieflens_core::DownloadProgressFn;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("On-device runtime unavailable: {0}")]
    Unavailable(String),

    #[error("Summarizer failed: {0}")]
    Summarize(String),

    #[error("Translator failed: {0}")]
    Translate(String),

    #[error("Model download failed: {0}")]
    Download(String),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryType {
    #[default]
    KeyPoints,
    Tldr,
    Teaser,
    Headline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryFormat {
    #[default]
    Markdown,
    PlainText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

/// Options passed when creating a summarizer session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizerOptions {
    pub summary_type: SummaryType,
    pub format: SummaryFormat,
    pub length: SummaryLength,
    /// The on-device summarizer only writes English
    pub output_language: String,
}

impl Default for SummarizerOptions {
    fn default() -> Self {
        Self {
            summary_type: SummaryType::KeyPoints,
            format: SummaryFormat::Markdown,
            length: SummaryLength::Medium,
            output_language: "en".to_string(),
        }
    }
}

/// Whether a translator for a language pair can be created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationAvailability {
    Available,
    /// A model has to be downloaded first
    AfterDownload,
    Unavailable,
}

/// A live summarizer; release it with `destroy` when done
#[async_trait]
pub trait SummarizerSession: Send {
    async fn summarize(&mut self, text: &str) -> Result<String>;

    fn destroy(self: Box<Self>) {}
}

/// A live translator for one language pair
#[async_trait]
pub trait TranslatorSession: Send {
    async fn translate(&mut self, text: &str) -> Result<String>;

    fn destroy(self: Box<Self>) {}
}

#[async_trait]
pub trait OnDeviceRuntime: Send + Sync {
    async fn create_summarizer(
        &self,
        options: &SummarizerOptions,
    ) -> Result<Box<dyn SummarizerSession>>;

    async fn translation_availability(&self, source: &str, target: &str)
    -> TranslationAvailability;

    /// Create a translator, reporting download progress (0.0..=1.0) when a
    /// model has to be fetched first
    async fn create_translator(
        &self,
        source: &str,
        target: &str,
        download_progress: Option<DownloadProgressFn>,
    ) -> Result<Box<dyn TranslatorSession>>;
}

/// Runtime for hosts without on-device models
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedRuntime;

#[async_trait]
impl OnDeviceRuntime for UnsupportedRuntime {
    async fn create_summarizer(
        &self,
        _options: &SummarizerOptions,
    ) -> Result<Box<dyn SummarizerSession>> {
        Err(RuntimeError::Unavailable(
            "no on-device summarizer on this host".to_string(),
        ))
    }

    async fn translation_availability(
        &self,
        _source: &str,
        _target: &str,
    ) -> TranslationAvailability {
        TranslationAvailability::Unavailable
    }

    async fn create_translator(
        &self,
        _source: &str,
        _target: &str,
        _download_progress: Option<DownloadProgressFn>,
    ) -> Result<Box<dyn TranslatorSession>> {
        Err(RuntimeError::Unavailable(
            "no on-device translator on this host".to_string(),
        ))
    }
}
