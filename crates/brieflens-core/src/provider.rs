//! Provider trait definitions
//!
//! A `Provider` is one invocation strategy for one backend family. The
//! pipeline only ever sees `Result<String, InvocationError>` values; an
//! implementation must convert every failure into an `InvocationError`.

use crate::{error::InvocationError, registry::Family};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Callback for model-download progress, in the range 0.0..=1.0
pub type DownloadProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

/// Everything a provider needs for one attempt
#[derive(Clone)]
pub struct InvocationRequest {
    /// Page content to summarize
    pub content: String,
    /// Effective output language (ISO 639-1)
    pub language: String,
    /// Wire model name; `None` for the local family
    pub wire_model_id: Option<String>,
    /// API key for remote families
    pub credential: Option<String>,
    /// Receives download progress for on-device models
    pub download_progress: Option<DownloadProgressFn>,
}

impl InvocationRequest {
    pub fn new(content: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            language: language.into(),
            wire_model_id: None,
            credential: None,
            download_progress: None,
        }
    }

    pub fn with_wire_model_id(mut self, wire_model_id: impl Into<String>) -> Self {
        self.wire_model_id = Some(wire_model_id.into());
        self
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    pub fn with_download_progress(mut self, callback: DownloadProgressFn) -> Self {
        self.download_progress = Some(callback);
        self
    }

    /// The credential if it is present and non-empty
    pub fn non_empty_credential(&self) -> Option<&str> {
        self.credential.as_deref().filter(|key| !key.trim().is_empty())
    }
}

impl fmt::Debug for InvocationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationRequest")
            .field("content_chars", &self.content.chars().count())
            .field("language", &self.language)
            .field("wire_model_id", &self.wire_model_id)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("download_progress", &self.download_progress.is_some())
            .finish()
    }
}

#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Family this provider serves
    fn family(&self) -> Family;

    /// Produce a summary, or the reason none could be produced
    async fn invoke(&self, request: InvocationRequest) -> Result<String, InvocationError>;
}

/// Host platform feature detection for the on-device family
pub trait PlatformCapabilities: Send + Sync {
    fn supports_on_device_summarization(&self) -> bool;
}

impl PlatformCapabilities for bool {
    fn supports_on_device_summarization(&self) -> bool {
        *self
    }
}

/// Network permission check for a remote origin
#[async_trait::async_trait]
pub trait PermissionGate: Send + Sync {
    async fn has_origin_access(&self, origin: &str) -> bool;
}

/// Permission gate that grants every origin
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantAll;

#[async_trait::async_trait]
impl PermissionGate for GrantAll {
    async fn has_origin_access(&self, _origin: &str) -> bool {
        true
    }
}

/// Permission gate backed by an explicit list of granted origins
#[derive(Debug, Clone, Default)]
pub struct OriginAllowList {
    origins: HashSet<String>,
}

impl OriginAllowList {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            origins: origins
                .into_iter()
                .map(|o| o.into().trim_end_matches('/').to_string())
                .collect(),
        }
    }
}

#[async_trait::async_trait]
impl PermissionGate for OriginAllowList {
    async fn has_origin_access(&self, origin: &str) -> bool {
        self.origins.contains(origin.trim_end_matches('/'))
    }
}
