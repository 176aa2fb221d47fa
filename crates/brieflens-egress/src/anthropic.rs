//! Anthropic egress connector

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

/// Anthropic connector configuration
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// Base URL for Anthropic API (default: https://api.anthropic.com)
    pub base_url: String,

    /// Anthropic API version (default: 2023-06-01)
    pub api_version: String,

    pub max_tokens: u32,

    /// HTTP client configuration
    pub client_config: HttpClientConfig,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            api_version: "2023-06-01".to_string(),
            max_tokens: 1024,
            client_config: HttpClientConfig::default(),
        }
    }
}

impl AnthropicConfig {
    /// Create a new Anthropic configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL (for custom endpoints)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the API version
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }
}

/// Anthropic connector
pub struct AnthropicConnector {
    config: AnthropicConfig,
    client: Client,
    permissions: Arc<dyn PermissionGate>,
}

impl AnthropicConnector {
    /// Create a new Anthropic connector
    pub fn new(config: AnthropicConfig) -> Result<Self> {
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

    /// Send one messages request and extract the first text block
    #[instrument(skip(self, api_key, content), fields(content_chars = content.len()))]
    pub async fn summarize(
        &self,
        api_key: &str,
        model: &str,
        language: &str,
        content: &str,
    ) -> Result<String> {
        let anthropic_req = to_anthropic_request(model, language, content, self.config.max_tokens);

        debug!("┌─────────────────────────────────────────────────────────");
        debug!("│ Anthropic Request Headers");
        debug!("├─────────────────────────────────────────────────────────");
        debug!("│ x-api-key: <api_key>");
        debug!("│ anthropic-version: {}", self.config.api_version);
        debug!("│ Content-Type: application/json");
        debug!("└─────────────────────────────────────────────────────────");

        let response = with_retry(self.config.client_config.max_retries, || {
            let anthropic_req = anthropic_req.clone();
            async move {
                let response = self
                    .client
                    .post(format!("{}/v1/messages", self.config.base_url))
                    .header("x-api-key", api_key)
                    .header("anthropic-version", &self.config.api_version)
                    .header("Content-Type", "application/json")
                    .json(&anthropic_req)
                    .send()
                    .await?;

                debug!("Anthropic response status: {}", response.status());

                read_json::<AnthropicResponse>(response, "Anthropic").await
            }
        })
        .await?;

        from_anthropic_response(response)
    }
}

#[async_trait]
impl Provider for AnthropicConnector {
    fn family(&self) -> Family {
        Family::Anthropic
    }

    #[instrument(skip(self, request), fields(family = "anthropic", model = ?request.wire_model_id))]
    async fn invoke(&self, request: InvocationRequest) -> std::result::Result<String, InvocationError> {
        let origin = self.origin();
        let api_key =
            preflight(Family::Anthropic, &request, self.permissions.as_ref(), &origin).await?;
        let model = request.wire_model_id.as_deref().ok_or_else(|| {
            InvocationError::Configuration("Anthropic request without a wire model id".to_string())
        })?;

        match self
            .summarize(api_key, model, &request.language, &request.content)
            .await
        {
            Ok(summary) => {
                info!(model, chars = summary.len(), "Anthropic summary received");
                Ok(summary)
            }
            Err(err) => {
                warn!(model, error = %err, "Anthropic request failed");
                Err(err.into())
            }
        }
    }
}

// Anthropic API types

#[derive(Debug, Clone, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContent>,
}

/// Content blocks; anything other than text is skipped
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum AnthropicContent {
    #[serde(rename = "text")]
    Text {
        #[serde(default)]
        text: Option<String>,
    },
    #[serde(other)]
    Other,
}

// Conversion functions

fn to_anthropic_request(
    model: &str,
    language: &str,
    content: &str,
    max_tokens: u32,
) -> AnthropicRequest {
    AnthropicRequest {
        model: model.to_string(),
        max_tokens,
        messages: vec![AnthropicMessage {
            role: "user".to_string(),
            content: build_prompt(content, language),
        }],
    }
}

fn from_anthropic_response(resp: AnthropicResponse) -> Result<String> {
    let text = resp.content.into_iter().find_map(|block| match block {
        AnthropicContent::Text { text } => text,
        AnthropicContent::Other => None,
    });

    finish_summary(text, "content text block")
}
