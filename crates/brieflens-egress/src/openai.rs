//! OpenAI egress connector

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

/// OpenAI connector configuration
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for OpenAI API (default: https://api.openai.com/v1)
    pub base_url: String,

    /// Organization ID (optional)
    pub organization: Option<String>,

    /// Upper bound on generated tokens
    pub max_tokens: u32,

    /// HTTP client configuration
    pub client_config: HttpClientConfig,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            organization: None,
            max_tokens: 1024,
            client_config: HttpClientConfig::default(),
        }
    }
}

impl OpenAIConfig {
    /// Create a new OpenAI configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL (for custom endpoints)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the organization ID
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }
}

/// OpenAI connector
pub struct OpenAIConnector {
    config: OpenAIConfig,
    client: Client,
    permissions: Arc<dyn PermissionGate>,
}

impl OpenAIConnector {
    /// Create a new OpenAI connector
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = create_client(&config.client_config)?;
        Ok(Self {
            config,
            client,
            permissions: Arc::new(GrantAll),
        })
    }

    /// Use a permission gate other than `GrantAll`
    pub fn with_permissions(mut self, permissions: Arc<dyn PermissionGate>) -> Self {
        self.permissions = permissions;
        self
    }

    /// Origin that must be granted before requests are sent
    pub fn origin(&self) -> String {
        origin_of(&self.config.base_url)
    }

    /// Send one chat completion request and extract the summary text
    #[instrument(skip(self, api_key, content), fields(content_chars = content.len()))]
    pub async fn summarize(
        &self,
        api_key: &str,
        model: &str,
        language: &str,
        content: &str,
    ) -> Result<String> {
        let openai_req = to_openai_request(model, language, content, self.config.max_tokens);

        debug!("┌─────────────────────────────────────────────────────────");
        debug!("│ OpenAI Request Headers");
        debug!("├─────────────────────────────────────────────────────────");
        debug!("│ Authorization: Bearer <api_key>");
        debug!("│ Content-Type: application/json");
        if let Some(ref org) = self.config.organization {
            debug!("│ OpenAI-Organization: {}", org);
        }
        debug!("└─────────────────────────────────────────────────────────");

        let max_retries = self.config.client_config.max_retries;
        let response = with_retry(max_retries, || {
            let openai_req = openai_req.clone();
            async move {
                let response = self
                    .client
                    .post(format!("{}/chat/completions", self.config.base_url))
                    .header("Authorization", format!("Bearer {}", api_key))
                    .header("Content-Type", "application/json")
                    .apply_organization_header(&self.config)
                    .json(&openai_req)
                    .send()
                    .await?;

                debug!("OpenAI response status: {}", response.status());

                read_json::<OpenAIChatResponse>(response, "OpenAI").await
            }
        })
        .await?;

        from_openai_response(response)
    }
}

#[async_trait]
impl Provider for OpenAIConnector {
    fn family(&self) -> Family {
        Family::OpenAI
    }

    #[instrument(skip(self, request), fields(family = "openai", model = ?request.wire_model_id))]
    async fn invoke(&self, request: InvocationRequest) -> std::result::Result<String, InvocationError> {
        let origin = self.origin();
        let api_key = preflight(Family::OpenAI, &request, self.permissions.as_ref(), &origin).await?;
        let model = request.wire_model_id.as_deref().ok_or_else(|| {
            InvocationError::Configuration("OpenAI request without a wire model id".to_string())
        })?;

        match self
            .summarize(api_key, model, &request.language, &request.content)
            .await
        {
            Ok(summary) => {
                info!(model, chars = summary.len(), "OpenAI summary received");
                Ok(summary)
            }
            Err(err) => {
                warn!(model, error = %err, "OpenAI request failed");
                Err(err.into())
            }
        }
    }
}

// OpenAI API types (only the fields this connector reads or writes)

#[derive(Debug, Clone, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIChatResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIChoice {
    #[serde(default)]
    message: Option<OpenAIResponseMessage>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

// Conversion functions

fn to_openai_request(model: &str, language: &str, content: &str, max_tokens: u32) -> OpenAIChatRequest {
    OpenAIChatRequest {
        model: model.to_string(),
        messages: vec![OpenAIMessage {
            role: "user".to_string(),
            content: build_prompt(content, language),
        }],
        max_tokens,
        temperature: 0.3,
    }
}

fn from_openai_response(resp: OpenAIChatResponse) -> Result<String> {
    let text = resp
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content);

    finish_summary(text, "choices[0].message.content")
}

// Helper trait for adding organization header
trait OrganizationHeader {
    fn apply_organization_header(self, config: &OpenAIConfig) -> Self;
}

impl OrganizationHeader for reqwest::RequestBuilder {
    fn apply_organization_header(self, config: &OpenAIConfig) -> Self {
        match config.organization {
            Some(ref org) => self.header("OpenAI-Organization", org),
            None => self,
        }
    }
}
