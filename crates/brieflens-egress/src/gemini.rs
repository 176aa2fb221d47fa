//! Gemini egress connector

use crate::{
    Result,
    client::{
        HttpClientConfig, create_client, finish_summary, origin_of, preflight, read_json,
        with_retry,
    },
    prompt::build_prompt,
};
use async_trait::async_trait;
use brieflens_core::{
    Family, GrantAll, InvocationError, InvocationRequest, PermissionGate, Provider,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Gemini connector configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Base URL for the Generative Language API
    /// (default: https://generativelanguage.googleapis.com)
    pub base_url: String,

    /// API version path segment (default: v1beta)
    pub api_version: String,

    pub client_config: HttpClientConfig,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_version: "v1beta".to_string(),
            client_config: HttpClientConfig::default(),
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL (for custom endpoints)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Gemini connector
pub struct GeminiConnector {
    config: GeminiConfig,
    client: Client,
    permissions: Arc<dyn PermissionGate>,
}

impl GeminiConnector {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = create_client(&config.client_config)?;
        Ok(Self {
            config,
            client,
            permissions: Arc::new(GrantAll),
        })
    }

    pub fn with_permissions(mut self, permissions: Arc<dyn PermissionGate>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn origin(&self) -> String {
        origin_of(&self.config.base_url)
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/{}/models/{}:generateContent",
            self.config.base_url, self.config.api_version, model
        )
    }

    #[instrument(skip(self, api_key, content), fields(content_chars = content.len()))]
    pub async fn summarize(
        &self,
        api_key: &str,
        model: &str,
        language: &str,
        content: &str,
    ) -> Result<String> {
        let gemini_req = to_gemini_request(language, content);
        let url = self.endpoint(model);
        debug!("Gemini endpoint: {}", url);

        let response = with_retry(self.config.client_config.max_retries, || {
            let gemini_req = gemini_req.clone();
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .post(url)
                    // Header keeps the key out of URLs that end up in logs
                    .header("x-goog-api-key", api_key)
                    .header("Content-Type", "application/json")
                    .json(&gemini_req)
                    .send()
                    .await?;

                debug!("Gemini response status: {}", response.status());

                read_json::<GeminiResponse>(response, "Gemini").await
            }
        })
        .await?;

        from_gemini_response(response)
    }
}

#[async_trait]
impl Provider for GeminiConnector {
    fn family(&self) -> Family {
        Family::Gemini
    }

    #[instrument(skip(self, request), fields(family = "gemini", model = ?request.wire_model_id))]
    async fn invoke(&self, request: InvocationRequest) -> std::result::Result<String, InvocationError> {
        let origin = self.origin();
        let api_key = preflight(Family::Gemini, &request, self.permissions.as_ref(), &origin).await?;
        let model = request.wire_model_id.as_deref().ok_or_else(|| {
            InvocationError::Configuration("Gemini request without a wire model id".to_string())
        })?;

        match self
            .summarize(api_key, model, &request.language, &request.content)
            .await
        {
            Ok(summary) => {
                info!(model, chars = summary.len(), "Gemini summary received");
                Ok(summary)
            }
            Err(err) => {
                warn!(model, error = %err, "Gemini request failed");
                Err(err.into())
            }
        }
    }
}

// Gemini API types

#[derive(Debug, Clone, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

fn to_gemini_request(language: &str, content: &str) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            parts: vec![GeminiPart {
                text: Some(build_prompt(content, language)),
            }],
        }],
    }
}

fn from_gemini_response(resp: GeminiResponse) -> Result<String> {
    let text = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text);

    finish_summary(text, "candidates[0].content.parts[0].text")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EgressError;

    #[test]
    fn test_endpoint() {
        let connector = GeminiConnector::new(GeminiConfig::new()).unwrap();
        assert_eq!(
            connector.endpoint("gemini-2.0-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(connector.origin(), "https://generativelanguage.googleapis.com");
    }

    #[test]
    fn test_to_gemini_request() {
        let req = to_gemini_request("ja", "ページの本文");
        let json = serde_json::to_value(&req).unwrap();

        let text = json["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.contains("Japanese"));
        assert!(text.ends_with("ページの本文"));
        assert!(json.get("model").is_none());
    }

    #[test]
    fn test_from_gemini_response() {
        let resp: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "- uno\n- dos\n"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10}
        }))
        .unwrap();

        assert_eq!(from_gemini_response(resp).unwrap(), "- uno\n- dos");
    }

    #[test]
    fn test_from_gemini_response_missing_text() {
        let cases = [
            serde_json::json!({"promptFeedback": {"blockReason": "SAFETY"}}),
            serde_json::json!({"candidates": []}),
            serde_json::json!({"candidates": [{"finishReason": "SAFETY"}]}),
            serde_json::json!({"candidates": [{"content": {"parts": []}}]}),
            serde_json::json!({"candidates": [{"content": {"parts": [{"inlineData": {}}]}}]}),
        ];

        for case in cases {
            let resp: GeminiResponse = serde_json::from_value(case).unwrap();
            assert!(matches!(
                from_gemini_response(resp),
                Err(EgressError::ParseError(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_invoke_without_credential() {
        let connector = GeminiConnector::new(GeminiConfig::new()).unwrap();
        let request = InvocationRequest::new("content", "en").with_wire_model_id("gemini-2.0-flash");

        let err = connector.invoke(request).await.unwrap_err();
        assert_eq!(
            err,
            InvocationError::MissingCredential {
                family: Family::Gemini
            }
        );
    }
}
