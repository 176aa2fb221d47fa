//! End-to-end fixtures for BriefLens
//!
//! Wires the real remote connectors against wiremock servers and a scripted
//! on-device runtime into a `SummarizationPipeline`.

use async_trait::async_trait;
use brieflens_core::{DownloadProgressFn, ProgressEvent, Settings};
use brieflens_egress::{
    anthropic::{AnthropicConfig, AnthropicConnector},
    gemini::{GeminiConfig, GeminiConnector},
    openai::{OpenAIConfig, OpenAIConnector},
};
use brieflens_ondevice::{
    OnDeviceInvoker, OnDeviceRuntime, RuntimeError, SummarizerOptions, SummarizerSession,
    TranslationAvailability, TranslatorSession,
};
use brieflens_routing::{InvokerSet, SummarizationPipeline};
use brieflens_storage::MetricsStore;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use wiremock::MockServer;

pub const FIVE_BULLETS: &str = "- one\n- two\n- three\n- four\n- five";

/// On-device runtime with canned summarizer and translator output
#[derive(Clone)]
pub struct ScriptedRuntime {
    summary: Result<String, RuntimeError>,
    availability: TranslationAvailability,
    translation: Result<String, RuntimeError>,
    download_steps: Vec<f64>,
}

impl ScriptedRuntime {
    pub fn summarizing(summary: &str) -> Self {
        Self {
            summary: Ok(summary.to_string()),
            availability: TranslationAvailability::Unavailable,
            translation: Err(RuntimeError::Translate("no translator".to_string())),
            download_steps: Vec::new(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            summary: Err(RuntimeError::Summarize(message.to_string())),
            ..Self::summarizing("")
        }
    }

    /// Translator available only after a model download reporting `steps`
    pub fn with_download_translation(mut self, translated: &str, steps: &[f64]) -> Self {
        self.availability = TranslationAvailability::AfterDownload;
        self.translation = Ok(translated.to_string());
        self.download_steps = steps.to_vec();
        self
    }
}

struct ScriptedSummarizer(Result<String, RuntimeError>);

#[async_trait]
impl SummarizerSession for ScriptedSummarizer {
    async fn summarize(&mut self, _text: &str) -> brieflens_ondevice::runtime::Result<String> {
        self.0.clone()
    }
}

struct ScriptedTranslator(Result<String, RuntimeError>);

#[async_trait]
impl TranslatorSession for ScriptedTranslator {
    async fn translate(&mut self, _text: &str) -> brieflens_ondevice::runtime::Result<String> {
        self.0.clone()
    }
}

#[async_trait]
impl OnDeviceRuntime for ScriptedRuntime {
    async fn create_summarizer(
        &self,
        _options: &SummarizerOptions,
    ) -> brieflens_ondevice::runtime::Result<Box<dyn SummarizerSession>> {
        Ok(Box::new(ScriptedSummarizer(self.summary.clone())))
    }

    async fn translation_availability(
        &self,
        _source: &str,
        _target: &str,
    ) -> TranslationAvailability {
        self.availability
    }

    async fn create_translator(
        &self,
        _source: &str,
        _target: &str,
        download_progress: Option<DownloadProgressFn>,
    ) -> brieflens_ondevice::runtime::Result<Box<dyn TranslatorSession>> {
        if let Some(callback) = download_progress {
            for step in &self.download_steps {
                callback(*step);
            }
        }
        Ok(Box::new(ScriptedTranslator(self.translation.clone())))
    }
}

/// Mock servers for the three remote families
pub struct RemoteServers {
    pub openai: MockServer,
    pub anthropic: MockServer,
    pub gemini: MockServer,
}

impl RemoteServers {
    pub async fn start() -> Self {
        Self {
            openai: MockServer::start().await,
            anthropic: MockServer::start().await,
            gemini: MockServer::start().await,
        }
    }

    /// Real connectors pointed at the mock servers, plus the local invoker
    pub fn invokers(&self, runtime: Option<ScriptedRuntime>) -> InvokerSet {
        let local = match runtime {
            Some(runtime) => OnDeviceInvoker::new(Arc::new(true), Arc::new(runtime)),
            None => OnDeviceInvoker::unsupported(),
        };

        InvokerSet::new()
            .with(Arc::new(local))
            .with(Arc::new(
                OpenAIConnector::new(OpenAIConfig::new().with_base_url(self.openai.uri()))
                    .expect("openai connector"),
            ))
            .with(Arc::new(
                AnthropicConnector::new(
                    AnthropicConfig::new().with_base_url(self.anthropic.uri()),
                )
                .expect("anthropic connector"),
            ))
            .with(Arc::new(
                GeminiConnector::new(GeminiConfig::new().with_base_url(self.gemini.uri()))
                    .expect("gemini connector"),
            ))
    }
}

/// Base URL of a local port nothing listens on
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// Settings carrying a key for every remote family
pub fn settings_with_keys() -> Settings {
    let mut settings = Settings::default();
    settings.api_keys.openai = Some("sk-openai-test".to_string());
    settings.api_keys.anthropic = Some("sk-ant-test".to_string());
    settings.api_keys.gemini = Some("gemini-test".to_string());
    settings
}

/// Pipeline with on-device support iff `runtime` is given
pub fn pipeline(
    servers: &RemoteServers,
    runtime: Option<ScriptedRuntime>,
    settings: Settings,
    metrics: MetricsStore,
) -> SummarizationPipeline {
    let supported = runtime.is_some();
    SummarizationPipeline::new(
        servers.invokers(runtime),
        Arc::new(supported),
        Arc::new(settings),
        metrics,
    )
}

/// Progress sink that keeps every event
pub fn recorder() -> (
    Arc<Mutex<Vec<ProgressEvent>>>,
    impl Fn(ProgressEvent) + Send + Sync + 'static,
) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    (events, move |event: ProgressEvent| {
        sink.lock().expect("progress lock").push(event)
    })
}

pub fn openai_body(text: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }]
    })
}

pub fn anthropic_body(text: &str) -> Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "model": "claude-3-5-haiku-latest",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn"
    })
}

pub fn gemini_body(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}
