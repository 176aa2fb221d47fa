//! BriefLens Egress Connectors
//!
//! This crate provides the remote summarization invokers:
//! - OpenAI chat completions connector
//! - Anthropic messages connector
//! - Gemini generateContent connector
//!
//! Each connector implements `brieflens_core::Provider` and converts every
//! failure into an `InvocationError` at that boundary.

pub mod anthropic;
pub mod client;
pub mod gemini;
pub mod openai;
pub mod prompt;

use brieflens_core::InvocationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EgressError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Provider error ({status_code}): {message}")]
    ProviderError { status_code: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Request timeout after {0}s")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, EgressError>;

impl From<EgressError> for InvocationError {
    fn from(err: EgressError) -> Self {
        match err {
            EgressError::HttpError(e) if e.is_timeout() => {
                InvocationError::Transport(format!("request timed out: {}", e))
            }
            EgressError::HttpError(e) => InvocationError::Transport(e.to_string()),
            EgressError::ProviderError {
                status_code,
                message,
            } => InvocationError::Status {
                status_code,
                message,
            },
            EgressError::ParseError(msg) => InvocationError::InvalidResponse(msg),
            EgressError::ConfigError(msg) => InvocationError::Configuration(msg),
            EgressError::Timeout(secs) => {
                InvocationError::Transport(format!("request timed out after {}s", secs))
            }
        }
    }
}
