//! Error types for BriefLens Core

use crate::registry::Family;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single provider attempt.
///
/// Every failure mode of an invoker is expressed as one of these values.
/// The `Display` output is what ends up in `AttemptRecord::error_message`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvocationError {
    /// Unknown model id or a family with no registered invoker. Never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Missing or empty API key for a remote family.
    #[error("No API key configured for {family}")]
    MissingCredential { family: Family },

    /// Missing network grant for the family's origin.
    #[error(
        "Permission to access {origin} has not been granted. Re-grant access to {origin} in the extension settings and try again."
    )]
    PermissionDenied { origin: String },

    /// Network, DNS, or timeout failure at the HTTP layer.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx response from the provider.
    #[error("Provider returned status {status_code}: {message}")]
    Status { status_code: u16, message: String },

    /// 2xx response without the expected nested text field.
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// The local on-device family is not available on this runtime.
    #[error("On-device summarization is not supported on this runtime")]
    CapabilityUnsupported,

    /// The on-device summarizer failed while producing a summary.
    #[error("On-device summarization failed: {0}")]
    OnDevice(String),
}

impl InvocationError {
    /// Whether the failure happened before any request left the process.
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            InvocationError::Configuration(_)
                | InvocationError::MissingCredential { .. }
                | InvocationError::PermissionDenied { .. }
                | InvocationError::CapabilityUnsupported
        )
    }
}
