//! Progress reporting for a single summarization call

use brieflens_core::{DownloadProgressFn, ProgressEvent, ProgressStep};
use futures::Stream;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Receiver of progress events
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        self(event)
    }
}

impl ProgressSink for UnboundedSender<ProgressEvent> {
    fn emit(&self, event: ProgressEvent) {
        // A dropped receiver just means nobody is listening any more
        let _ = self.send(event);
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Channel whose receiving half is a `Stream` of events
pub fn progress_channel() -> (UnboundedSender<ProgressEvent>, ProgressStream) {
    let (tx, rx) = unbounded_channel();
    (tx, ProgressStream { rx })
}

/// Ends once the call has finished and the sender is dropped
pub struct ProgressStream {
    rx: UnboundedReceiver<ProgressEvent>,
}

impl Stream for ProgressStream {
    type Item = ProgressEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

struct ReporterState {
    percent: u8,
    estimate_seconds: f64,
    provider_id: String,
}

/// Wraps a sink and keeps the reported percentage non-decreasing.
///
/// Remaining time is the current provider's estimate scaled by the share
/// of work left.
pub struct ProgressReporter {
    sink: Arc<dyn ProgressSink>,
    state: Mutex<ReporterState>,
}

impl ProgressReporter {
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            sink,
            state: Mutex::new(ReporterState {
                percent: 0,
                estimate_seconds: 0.0,
                provider_id: String::new(),
            }),
        }
    }

    /// Switch to a provider and its expected duration
    pub fn set_provider(&self, provider_id: &str, estimate_seconds: f64) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.provider_id = provider_id.to_string();
        state.estimate_seconds = estimate_seconds.max(0.0);
    }

    pub fn percent(&self) -> u8 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).percent
    }

    pub fn emit(
        &self,
        step: ProgressStep,
        label: impl Into<String>,
        percent: u8,
        succeeded: Option<bool>,
    ) {
        let event = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.percent = state.percent.max(percent.min(100));
            let remaining = state.estimate_seconds * f64::from(100 - state.percent) / 100.0;

            ProgressEvent {
                step,
                step_label: label.into(),
                percent_complete: state.percent,
                estimated_seconds_remaining: remaining.max(0.0),
                provider_id: state.provider_id.clone(),
                succeeded,
            }
        };

        // Sink runs outside the lock
        self.sink.emit(event);
    }

    /// Callback forwarding model-download progress as `DownloadingModel`
    /// events at the current percentage
    pub fn download_callback(self: &Arc<Self>) -> DownloadProgressFn {
        let reporter = Arc::clone(self);
        Arc::new(move |fraction: f64| {
            let pct = (fraction.clamp(0.0, 1.0) * 100.0).round();
            reporter.emit(
                ProgressStep::DownloadingModel,
                format!("Downloading on-device model ({}%)", pct),
                reporter.percent(),
                None,
            );
        })
    }
}
