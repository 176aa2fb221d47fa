use super::*;
use crate::runtime::{RuntimeError, SummarizerSession, TranslatorSession};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
struct Counters {
    summarizers_destroyed: AtomicUsize,
    translators_created: AtomicUsize,
    translators_destroyed: AtomicUsize,
}

struct FakeSummarizer {
    output: std::result::Result<String, RuntimeError>,
    counters: Arc<Counters>,
}

#[async_trait]
impl SummarizerSession for FakeSummarizer {
    async fn summarize(&mut self, _text: &str) -> crate::runtime::Result<String> {
        self.output.clone()
    }

    fn destroy(self: Box<Self>) {
        self.counters
            .summarizers_destroyed
            .fetch_add(1, Ordering::SeqCst);
    }
}

struct FakeTranslator {
    output: std::result::Result<String, RuntimeError>,
    counters: Arc<Counters>,
}

#[async_trait]
impl TranslatorSession for FakeTranslator {
    async fn translate(&mut self, _text: &str) -> crate::runtime::Result<String> {
        self.output.clone()
    }

    fn destroy(self: Box<Self>) {
        self.counters
            .translators_destroyed
            .fetch_add(1, Ordering::SeqCst);
    }
}

struct FakeRuntime {
    summary: std::result::Result<String, RuntimeError>,
    availability: TranslationAvailability,
    translation: std::result::Result<String, RuntimeError>,
    counters: Arc<Counters>,
    options_seen: Mutex<Option<SummarizerOptions>>,
}

impl FakeRuntime {
    fn new(summary: &str) -> Self {
        Self {
            summary: Ok(summary.to_string()),
            availability: TranslationAvailability::Available,
            translation: Ok("- traduit".to_string()),
            counters: Arc::new(Counters::default()),
            options_seen: Mutex::new(None),
        }
    }
}

#[async_trait]
impl OnDeviceRuntime for FakeRuntime {
    async fn create_summarizer(
        &self,
        options: &SummarizerOptions,
    ) -> crate::runtime::Result<Box<dyn SummarizerSession>> {
        *self.options_seen.lock().unwrap() = Some(options.clone());
        Ok(Box::new(FakeSummarizer {
            output: self.summary.clone(),
            counters: self.counters.clone(),
        }))
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
    ) -> crate::runtime::Result<Box<dyn TranslatorSession>> {
        self.counters
            .translators_created
            .fetch_add(1, Ordering::SeqCst);
        if let Some(progress) = download_progress {
            progress(0.5);
            progress(1.0);
        }
        Ok(Box::new(FakeTranslator {
            output: self.translation.clone(),
            counters: self.counters.clone(),
        }))
    }
}

fn invoker(runtime: FakeRuntime) -> (OnDeviceInvoker, Arc<FakeRuntime>) {
    let runtime = Arc::new(runtime);
    (OnDeviceInvoker::new(Arc::new(true), runtime.clone()), runtime)
}

#[tokio::test]
async fn test_unsupported_capability() {
    let invoker = OnDeviceInvoker::unsupported();
    assert!(!invoker.is_supported());
    assert_eq!(invoker.family(), Family::Local);

    let err = invoker
        .invoke(InvocationRequest::new("content", "en"))
        .await
        .unwrap_err();
    assert_eq!(err, InvocationError::CapabilityUnsupported);
}

#[tokio::test]
async fn test_capability_checked_before_runtime() {
    let runtime = Arc::new(FakeRuntime::new("- summary"));
    let invoker = OnDeviceInvoker::new(Arc::new(false), runtime.clone());

    let err = invoker
        .invoke(InvocationRequest::new("content", "en"))
        .await
        .unwrap_err();
    assert_eq!(err, InvocationError::CapabilityUnsupported);
    assert!(runtime.options_seen.lock().unwrap().is_none());
}

#[tokio::test]
async fn test_english_summary_uses_fixed_options() {
    let (invoker, runtime) = invoker(FakeRuntime::new("  - point one\n- point two  "));

    let summary = invoker
        .invoke(InvocationRequest::new("content", "en"))
        .await
        .unwrap();

    assert_eq!(summary, "- point one\n- point two");
    assert_eq!(
        runtime.options_seen.lock().unwrap().clone(),
        Some(SummarizerOptions::default())
    );
    assert_eq!(runtime.counters.summarizers_destroyed.load(Ordering::SeqCst), 1);
    assert_eq!(runtime.counters.translators_created.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_summarizer_failure_fails_attempt_and_releases_session() {
    let mut fake = FakeRuntime::new("");
    fake.summary = Err(RuntimeError::Summarize("model crashed".to_string()));
    let (invoker, runtime) = invoker(fake);

    let err = invoker
        .invoke(InvocationRequest::new("content", "en"))
        .await
        .unwrap_err();

    match err {
        InvocationError::OnDevice(msg) => assert!(msg.contains("model crashed")),
        other => panic!("expected on-device error, got {:?}", other),
    }
    assert_eq!(runtime.counters.summarizers_destroyed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_summary_is_a_failure() {
    let (invoker, _) = invoker(FakeRuntime::new("   "));
    let err = invoker
        .invoke(InvocationRequest::new("content", "en"))
        .await
        .unwrap_err();
    assert!(matches!(err, InvocationError::OnDevice(_)));
}

#[tokio::test]
async fn test_translates_when_available() {
    let (invoker, runtime) = invoker(FakeRuntime::new("- english"));

    let summary = invoker
        .invoke(InvocationRequest::new("content", "fr"))
        .await
        .unwrap();

    assert_eq!(summary, "- traduit");
    assert_eq!(runtime.counters.translators_created.load(Ordering::SeqCst), 1);
    assert_eq!(runtime.counters.translators_destroyed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_translation_after_download_reports_progress() {
    let mut fake = FakeRuntime::new("- english");
    fake.availability = TranslationAvailability::AfterDownload;
    let (invoker, _) = invoker(fake);

    let seen: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let request = InvocationRequest::new("content", "ja").with_download_progress(Arc::new(
        move |fraction: f64| sink.lock().unwrap().push(fraction),
    ));

    let summary = invoker.invoke(request).await.unwrap();

    assert_eq!(summary, "- traduit");
    assert_eq!(*seen.lock().unwrap(), vec![0.5, 1.0]);
}

#[tokio::test]
async fn test_unavailable_translation_returns_english() {
    let mut fake = FakeRuntime::new("- english");
    fake.availability = TranslationAvailability::Unavailable;
    let (invoker, runtime) = invoker(fake);

    let summary = invoker
        .invoke(InvocationRequest::new("content", "de"))
        .await
        .unwrap();

    assert_eq!(summary, "- english");
    assert_eq!(runtime.counters.translators_created.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_translation_failure_degrades_to_english() {
    let mut fake = FakeRuntime::new("- english");
    fake.translation = Err(RuntimeError::Translate("boom".to_string()));
    let (invoker, runtime) = invoker(fake);

    let summary = invoker
        .invoke(InvocationRequest::new("content", "es"))
        .await
        .unwrap();

    assert_eq!(summary, "- english");
    assert_eq!(runtime.counters.translators_destroyed.load(Ordering::SeqCst), 1);
}
