//! Shared HTTP client utilities

use crate::{EgressError, Result};
use brieflens_core::{Family, InvocationError, InvocationRequest, PermissionGate};
use reqwest::{Client, ClientBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest error body kept in a status failure message
const MAX_ERROR_BODY_CHARS: usize = 500;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Overall request timeout in seconds; `None` leaves requests unbounded
    pub timeout_secs: Option<u64>,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Maximum number of idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Retries for transient transport errors within a single attempt
    pub max_retries: u32,

    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            connect_timeout_secs: 10,
            pool_max_idle_per_host: 8,
            max_retries: 0,
            user_agent: format!("BriefLens/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Create a configured HTTP client with connection pooling
pub fn create_client(config: &HttpClientConfig) -> Result<Client> {
    let mut builder = ClientBuilder::new()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        // Expire idle connections before upstream servers close them
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .user_agent(&config.user_agent);

    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder
        .build()
        .map_err(|e| EgressError::ConfigError(format!("Failed to create HTTP client: {}", e)))
}

/// Retry policy for transient errors
pub async fn with_retry<F, Fut, T>(max_retries: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let backoff_ms = 2u64.pow(attempt - 1) * 100; // 100ms, 200ms, 400ms
            debug!(
                "Retrying request after {}ms (attempt {}/{})",
                backoff_ms, attempt, max_retries
            );
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        }

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let should_retry = match &e {
                    EgressError::HttpError(req_err) => req_err.is_connect() || req_err.is_timeout(),
                    EgressError::ProviderError { status_code, .. } => {
                        matches!(status_code, 429 | 500 | 502 | 503 | 504)
                    }
                    EgressError::Timeout(_) => true,
                    _ => false,
                };

                if should_retry && attempt < max_retries {
                    warn!(
                        "Request failed (attempt {}/{}): {}",
                        attempt + 1,
                        max_retries,
                        e
                    );
                    last_error = Some(e);
                } else {
                    return Err(e);
                }
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| EgressError::ConfigError("Retry loop exited unexpectedly".to_string())))
}

/// Origin (`scheme://host[:port]`) of a base URL, as used for permission grants
pub fn origin_of(base_url: &str) -> String {
    match Url::parse(base_url) {
        Ok(url) => url.origin().ascii_serialization(),
        Err(_) => base_url.trim_end_matches('/').to_string(),
    }
}

/// Checks shared by every remote family before any request is built.
///
/// Returns the API key to use.
pub async fn preflight<'a>(
    family: Family,
    request: &'a InvocationRequest,
    permissions: &dyn PermissionGate,
    origin: &str,
) -> std::result::Result<&'a str, InvocationError> {
    let api_key = request
        .non_empty_credential()
        .ok_or(InvocationError::MissingCredential { family })?;

    if !permissions.has_origin_access(origin).await {
        return Err(InvocationError::PermissionDenied {
            origin: origin.to_string(),
        });
    }

    Ok(api_key)
}

/// Turn an HTTP response into a typed body.
///
/// Non-2xx statuses become `ProviderError`; bodies that are not valid JSON
/// for `T` become `ParseError`.
pub async fn read_json<T: DeserializeOwned>(response: reqwest::Response, provider: &str) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let status_code = status.as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error body".to_string());

        return Err(EgressError::ProviderError {
            status_code,
            message: truncate_chars(&body, MAX_ERROR_BODY_CHARS).to_string(),
        });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice::<T>(&bytes)
        .map_err(|e| EgressError::ParseError(format!("{} response is not valid JSON: {}", provider, e)))
}

/// Trim a summary and reject empty output
pub fn finish_summary(text: Option<String>, field: &str) -> Result<String> {
    match text.map(|t| t.trim().to_string()) {
        Some(summary) if !summary.is_empty() => Ok(summary),
        _ => Err(EgressError::ParseError(format!("missing {}", field))),
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brieflens_core::GrantAll;
    use brieflens_core::OriginAllowList;

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::default();
        assert_eq!(config.timeout_secs, None);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.pool_max_idle_per_host, 8);
        assert_eq!(config.max_retries, 0);
        assert!(config.user_agent.starts_with("BriefLens/"));
    }

    #[test]
    fn test_create_client() {
        let config = HttpClientConfig::default();
        assert!(create_client(&config).is_ok());

        let config = HttpClientConfig {
            timeout_secs: Some(30),
            ..HttpClientConfig::default()
        };
        assert!(create_client(&config).is_ok());
    }

    #[tokio::test]
    async fn test_retry_success_first_attempt() {
        let result = with_retry(3, || async { Ok::<i32, EgressError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_non_retryable_error() {
        let calls = std::sync::atomic::AtomicU32::new(0);
        let result = with_retry(3, || {
            calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async { Err::<i32, EgressError>(EgressError::ParseError("bad".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_transient_status_until_success() {
        let calls = std::sync::atomic::AtomicU32::new(0);
        let result = with_retry(2, || {
            let n = calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(EgressError::ProviderError {
                        status_code: 503,
                        message: "busy".to_string(),
                    })
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_makes_one_call() {
        let calls = std::sync::atomic::AtomicU32::new(0);
        let result = with_retry(0, || {
            calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async {
                Err::<(), EgressError>(EgressError::ProviderError {
                    status_code: 500,
                    message: String::new(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_origin_of() {
        assert_eq!(origin_of("https://api.openai.com/v1"), "https://api.openai.com");
        assert_eq!(origin_of("http://127.0.0.1:8080/"), "http://127.0.0.1:8080");
        assert_eq!(origin_of("not a url/"), "not a url");
    }

    #[tokio::test]
    async fn test_preflight_missing_credential() {
        let request = InvocationRequest::new("text", "en").with_credential("");
        let err = preflight(Family::OpenAI, &request, &GrantAll, "https://api.openai.com")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            InvocationError::MissingCredential {
                family: Family::OpenAI
            }
        );
    }

    #[tokio::test]
    async fn test_preflight_permission_denied() {
        let request = InvocationRequest::new("text", "en").with_credential("key");
        let gate = OriginAllowList::new(["https://api.openai.com"]);
        let err = preflight(
            Family::Gemini,
            &request,
            &gate,
            "https://generativelanguage.googleapis.com",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, InvocationError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_preflight_ok() {
        let request = InvocationRequest::new("text", "en").with_credential("key");
        let key = preflight(Family::Anthropic, &request, &GrantAll, "https://api.anthropic.com")
            .await
            .unwrap();
        assert_eq!(key, "key");
    }

    #[test]
    fn test_finish_summary() {
        assert_eq!(
            finish_summary(Some("  - a\n- b \n".to_string()), "text").unwrap(),
            "- a\n- b"
        );
        assert!(finish_summary(None, "text").is_err());
        assert!(finish_summary(Some("   ".to_string()), "text").is_err());
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
