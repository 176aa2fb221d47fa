//! Local family invoker

use crate::runtime::{
    OnDeviceRuntime, SummarizerOptions, TranslationAvailability, UnsupportedRuntime,
};
use async_trait::async_trait;
use brieflens_core::{
    DownloadProgressFn, Family, InvocationError, InvocationRequest, PlatformCapabilities,
    Provider, language::DEFAULT_LANGUAGE,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Summarizes in English on the device, then translates when another
/// language was requested.
///
/// Translation is best effort: if no translator exists for the pair, or it
/// fails, the English summary is returned and the attempt still succeeds.
pub struct OnDeviceInvoker {
    capabilities: Arc<dyn PlatformCapabilities>,
    runtime: Arc<dyn OnDeviceRuntime>,
    options: SummarizerOptions,
}

impl OnDeviceInvoker {
    pub fn new(
        capabilities: Arc<dyn PlatformCapabilities>,
        runtime: Arc<dyn OnDeviceRuntime>,
    ) -> Self {
        Self {
            capabilities,
            runtime,
            options: SummarizerOptions::default(),
        }
    }

    /// Invoker for hosts with no on-device models
    pub fn unsupported() -> Self {
        Self::new(Arc::new(false), Arc::new(UnsupportedRuntime))
    }

    pub fn is_supported(&self) -> bool {
        self.capabilities.supports_on_device_summarization()
    }

    async fn summarize_english(&self, content: &str) -> Result<String, InvocationError> {
        let mut session = self
            .runtime
            .create_summarizer(&self.options)
            .await
            .map_err(|e| InvocationError::OnDevice(e.to_string()))?;

        let result = session.summarize(content).await;
        session.destroy();

        let summary = result.map_err(|e| InvocationError::OnDevice(e.to_string()))?;
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(InvocationError::OnDevice(
                "summarizer returned no text".to_string(),
            ));
        }
        Ok(summary.to_string())
    }

    /// Translate `text` from English, or `None` when translation is not possible
    async fn translate(
        &self,
        text: &str,
        target: &str,
        download_progress: Option<DownloadProgressFn>,
    ) -> Option<String> {
        let availability = self
            .runtime
            .translation_availability(DEFAULT_LANGUAGE, target)
            .await;

        let progress = match availability {
            TranslationAvailability::Available => None,
            TranslationAvailability::AfterDownload => {
                debug!(target_language = target, "translator model needs download");
                download_progress
            }
            TranslationAvailability::Unavailable => {
                info!(target_language = target, "no on-device translator, keeping English");
                return None;
            }
        };

        let mut translator = match self
            .runtime
            .create_translator(DEFAULT_LANGUAGE, target, progress)
            .await
        {
            Ok(translator) => translator,
            Err(e) => {
                warn!(target_language = target, error = %e, "translator unavailable, keeping English");
                return None;
            }
        };

        let result = translator.translate(text).await;
        translator.destroy();

        match result {
            Ok(translated) if !translated.trim().is_empty() => Some(translated.trim().to_string()),
            Ok(_) => {
                warn!(target_language = target, "translator returned no text, keeping English");
                None
            }
            Err(e) => {
                warn!(target_language = target, error = %e, "translation failed, keeping English");
                None
            }
        }
    }
}

#[async_trait]
impl Provider for OnDeviceInvoker {
    fn family(&self) -> Family {
        Family::Local
    }

    #[instrument(skip(self, request), fields(family = "local", language = %request.language))]
    async fn invoke(&self, request: InvocationRequest) -> Result<String, InvocationError> {
        if !self.is_supported() {
            return Err(InvocationError::CapabilityUnsupported);
        }

        let summary = self.summarize_english(&request.content).await?;

        if request.language.is_empty() || request.language == DEFAULT_LANGUAGE {
            return Ok(summary);
        }

        match self
            .translate(&summary, &request.language, request.download_progress.clone())
            .await
        {
            Some(translated) => Ok(translated),
            None => Ok(summary),
        }
    }
}

#[cfg(test)]
mod tests;
