//! User settings consumed by the summarization pipeline
//!
//! The pipeline reads settings through `SettingsSource` on every call so
//! that changes made elsewhere (settings page, config file) are picked up
//! without restarting.

use crate::{Result, registry::Family};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API keys for the remote families
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<String>,
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("ApiKeys")
            .field("openai", &redact(&self.openai))
            .field("anthropic", &redact(&self.anthropic))
            .field("gemini", &redact(&self.gemini))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// Preferred model id when the caller does not force one
    #[serde(default)]
    pub default_model: Option<String>,

    #[serde(default = "default_true")]
    pub fallback_enabled: bool,

    /// Requested output language (ISO 639-1)
    #[serde(default)]
    pub language: Option<String>,

    /// Origins the user granted network access to; `None` grants all
    #[serde(default)]
    pub granted_origins: Option<Vec<String>>,

    /// Per-attempt deadline; no deadline when unset
    #[serde(default)]
    pub attempt_timeout_secs: Option<u64>,

    /// Where provider stats are persisted
    #[serde(default)]
    pub metrics_path: Option<String>,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_keys: ApiKeys::default(),
            default_model: None,
            fallback_enabled: true,
            language: None,
            granted_origins: None,
            attempt_timeout_secs: None,
            metrics_path: None,
            logging: LoggingSettings::default(),
        }
    }
}

impl Settings {
    /// Stored credential for a family; the local family never has one
    pub fn credential(&self, family: Family) -> Option<&str> {
        match family {
            Family::Local => None,
            Family::OpenAI => self.api_keys.openai.as_deref(),
            Family::Anthropic => self.api_keys.anthropic.as_deref(),
            Family::Gemini => self.api_keys.gemini.as_deref(),
        }
    }

    pub fn set_credential(&mut self, family: Family, key: impl Into<String>) {
        let key = Some(key.into());
        match family {
            Family::Local => {}
            Family::OpenAI => self.api_keys.openai = key,
            Family::Anthropic => self.api_keys.anthropic = key,
            Family::Gemini => self.api_keys.gemini = key,
        }
    }
}

/// Read access to stored settings
#[async_trait::async_trait]
pub trait SettingsSource: Send + Sync {
    async fn load(&self) -> Result<Settings>;
}

#[async_trait::async_trait]
impl SettingsSource for Settings {
    async fn load(&self) -> Result<Settings> {
        Ok(self.clone())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.fallback_enabled);
        assert!(settings.default_model.is_none());
        assert_eq!(settings.logging.level, "info");
        assert!(settings.attempt_timeout_secs.is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"api_keys": {"openai": "sk-1"}, "language": "fr"}"#).unwrap();
        assert!(settings.fallback_enabled);
        assert_eq!(settings.credential(Family::OpenAI), Some("sk-1"));
        assert_eq!(settings.credential(Family::Anthropic), None);
        assert_eq!(settings.language.as_deref(), Some("fr"));
    }

    #[test]
    fn test_set_credential() {
        let mut settings = Settings::default();
        settings.set_credential(Family::Gemini, "g-key");
        settings.set_credential(Family::Local, "ignored");
        assert_eq!(settings.credential(Family::Gemini), Some("g-key"));
        assert_eq!(settings.credential(Family::Local), None);
    }

    #[test]
    fn test_debug_redacts_keys() {
        let mut settings = Settings::default();
        settings.set_credential(Family::Anthropic, "sk-ant-secret");
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("sk-ant-secret"));
    }

    #[tokio::test]
    async fn test_settings_is_its_own_source() {
        let mut settings = Settings::default();
        settings.default_model = Some("gpt-4o".to_string());
        let loaded = settings.load().await.unwrap();
        assert_eq!(loaded.default_model.as_deref(), Some("gpt-4o"));
    }
}
