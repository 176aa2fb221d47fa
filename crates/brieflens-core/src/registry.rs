//! Model registry
//!
//! Static mapping from a user-selectable model id to its backend family and
//! wire-level model name. Built once on first use and never mutated.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Backend family: determines the invocation strategy and wire protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// On-device summarizer provided by the host platform
    Local,
    /// OpenAI chat completions API
    #[serde(rename = "openai")]
    OpenAI,
    /// Anthropic messages API
    Anthropic,
    /// Google Gemini generateContent API
    Gemini,
}

impl Family {
    pub const ALL: [Family; 4] = [
        Family::Local,
        Family::OpenAI,
        Family::Anthropic,
        Family::Gemini,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Local => "local",
            Family::OpenAI => "openai",
            Family::Anthropic => "anthropic",
            Family::Gemini => "gemini",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Family::Local),
            "openai" => Ok(Family::OpenAI),
            "anthropic" => Ok(Family::Anthropic),
            "gemini" => Ok(Family::Gemini),
            other => Err(format!("Unknown family '{}'", other)),
        }
    }
}

/// Immutable model descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelConfig {
    /// Stable, user-selectable model id
    pub id: &'static str,
    pub family: Family,
    /// Model name sent on the wire; `None` for the local family
    pub wire_model_id: Option<&'static str>,
    pub display_name: &'static str,
    /// Informational only
    pub unit_cost: f64,
}

/// Model used when neither the caller nor the stored settings pick one
pub const DEFAULT_MODEL_ID: &str = "on-device";

static MODELS: &[ModelConfig] = &[
    ModelConfig {
        id: "on-device",
        family: Family::Local,
        wire_model_id: None,
        display_name: "On-device (Built-in AI)",
        unit_cost: 0.0,
    },
    ModelConfig {
        id: "gpt-4o-mini",
        family: Family::OpenAI,
        wire_model_id: Some("gpt-4o-mini"),
        display_name: "GPT-4o mini",
        unit_cost: 0.15,
    },
    ModelConfig {
        id: "gpt-4o",
        family: Family::OpenAI,
        wire_model_id: Some("gpt-4o"),
        display_name: "GPT-4o",
        unit_cost: 2.5,
    },
    ModelConfig {
        id: "claude-3-5-haiku",
        family: Family::Anthropic,
        wire_model_id: Some("claude-3-5-haiku-latest"),
        display_name: "Claude 3.5 Haiku",
        unit_cost: 0.8,
    },
    ModelConfig {
        id: "claude-3-5-sonnet",
        family: Family::Anthropic,
        wire_model_id: Some("claude-3-5-sonnet-latest"),
        display_name: "Claude 3.5 Sonnet",
        unit_cost: 3.0,
    },
    ModelConfig {
        id: "gemini-2.0-flash",
        family: Family::Gemini,
        wire_model_id: Some("gemini-2.0-flash"),
        display_name: "Gemini 2.0 Flash",
        unit_cost: 0.1,
    },
    ModelConfig {
        id: "gemini-1.5-pro",
        family: Family::Gemini,
        wire_model_id: Some("gemini-1.5-pro"),
        display_name: "Gemini 1.5 Pro",
        unit_cost: 1.25,
    },
];

static INDEX: Lazy<HashMap<&'static str, &'static ModelConfig>> =
    Lazy::new(|| MODELS.iter().map(|m| (m.id, m)).collect());

/// Read-only lookup over the static model table
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Look up a model by id. `None` means the model is unknown.
    pub fn lookup(model_id: &str) -> Option<&'static ModelConfig> {
        INDEX.get(model_id).copied()
    }

    /// All models in display order
    pub fn all() -> &'static [ModelConfig] {
        MODELS
    }

    /// The model id that stands in for a family in fallback lists
    pub fn representative(family: Family) -> &'static str {
        match family {
            Family::Local => "on-device",
            Family::OpenAI => "gpt-4o-mini",
            Family::Anthropic => "claude-3-5-haiku",
            Family::Gemini => "gemini-2.0-flash",
        }
    }

    pub fn default_model_id() -> &'static str {
        DEFAULT_MODEL_ID
    }
}
