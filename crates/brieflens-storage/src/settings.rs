//! File-backed settings with environment overrides

use crate::traits::{StorageError, StorageResult};
use async_trait::async_trait;
use brieflens_core::{Family, Settings, SettingsSource};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads `Settings` from a YAML or TOML file on every load.
///
/// A missing file yields defaults. Environment variables are applied on top
/// of whatever the file contains.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: Option<PathBuf>,
}

impl FileSettingsStore {
    /// Store backed by `path`; a leading `~` is expanded
    pub fn new(path: impl AsRef<str>) -> Self {
        let expanded = shellexpand::tilde(path.as_ref());
        Self {
            path: Some(PathBuf::from(expanded.as_ref())),
        }
    }

    /// Store at the platform config location, e.g. `~/.config/brieflens/config.yaml`
    pub fn default_location() -> Self {
        Self {
            path: default_settings_path(),
        }
    }

    /// Defaults plus environment only
    pub fn env_only() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Blocking load, for startup before a runtime exists
    pub fn load_settings(&self) -> StorageResult<Settings> {
        let contents = match &self.path {
            Some(path) => Self::missing_as_none(path, std::fs::read_to_string(path))?,
            None => None,
        };
        self.finish(contents)
    }

    /// Same as `load_settings` without blocking the runtime
    pub async fn load_settings_async(&self) -> StorageResult<Settings> {
        let contents = match &self.path {
            Some(path) => Self::missing_as_none(path, tokio::fs::read_to_string(path).await)?,
            None => None,
        };
        self.finish(contents)
    }

    fn missing_as_none(
        path: &Path,
        read: std::io::Result<String>,
    ) -> StorageResult<Option<String>> {
        match read {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Settings file not found, using defaults");
                Ok(None)
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn finish(&self, contents: Option<String>) -> StorageResult<Settings> {
        let mut settings = match (&self.path, contents) {
            (Some(path), Some(contents)) => Self::parse(path, &contents)?,
            _ => Settings::default(),
        };
        merge_env(&mut settings);
        Ok(settings)
    }

    fn parse(path: &Path, contents: &str) -> StorageResult<Settings> {
        if contents.trim().is_empty() {
            return Ok(Settings::default());
        }

        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(contents)
                .map_err(|e| StorageError::Config(format!("TOML parse error: {}", e)))
        } else {
            // YAML is the default format
            serde_yaml::from_str(contents)
                .map_err(|e| StorageError::Config(format!("YAML parse error: {}", e)))
        }
    }
}

#[async_trait]
impl SettingsSource for FileSettingsStore {
    async fn load(&self) -> brieflens_core::Result<Settings> {
        Ok(self.load_settings_async().await?)
    }
}

pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("brieflens").join("config.yaml"))
}

/// Apply environment variables to `settings` (env vars take precedence)
pub fn merge_env(settings: &mut Settings) {
    // Provider API keys (no BRIEFLENS_ prefix for these)
    for (var, family) in [
        ("OPENAI_API_KEY", Family::OpenAI),
        ("ANTHROPIC_API_KEY", Family::Anthropic),
        ("GEMINI_API_KEY", Family::Gemini),
    ] {
        if let Ok(key) = std::env::var(var) {
            settings.set_credential(family, key);
        }
    }

    if let Ok(val) = std::env::var("BRIEFLENS_DEFAULT_MODEL") {
        settings.default_model = Some(val);
    }

    if let Ok(val) = std::env::var("BRIEFLENS_FALLBACK_ENABLED") {
        match val.to_lowercase().as_str() {
            "true" | "1" | "yes" => settings.fallback_enabled = true,
            "false" | "0" | "no" => settings.fallback_enabled = false,
            _ => warn!(value = %val, "Invalid BRIEFLENS_FALLBACK_ENABLED, keeping configured value"),
        }
    }

    if let Ok(val) = std::env::var("BRIEFLENS_LANGUAGE") {
        settings.language = Some(val);
    }

    if let Ok(val) = std::env::var("BRIEFLENS_LOG_LEVEL") {
        settings.logging.level = val;
    }
}
