//! Language support resolution
//!
//! Decides which output language to request from a family. Codes are
//! compared exactly; callers pass canonical lowercase ISO 639-1 codes.

use crate::registry::Family;
use serde::{Deserialize, Serialize};

/// The universal floor every family can produce
pub const DEFAULT_LANGUAGE: &str = "en";

const LOCAL_LANGUAGES: &[&str] = &["en", "es", "ja", "fr", "de", "it", "pt"];

const REMOTE_LANGUAGES: &[&str] = &[
    "en", "es", "fr", "de", "it", "pt", "nl", "pl", "ru", "uk", "tr", "ar", "hi", "ja", "ko", "zh",
    "sv", "da", "fi", "no", "cs", "el", "he", "id", "vi", "th",
];

/// Outcome of checking a requested language against a family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageDecision {
    pub supported: bool,
    /// Language actually requested from the provider
    pub effective_language: String,
    /// True when the requested language was downgraded to the default
    pub needs_fallback: bool,
}

/// Supported language codes for a family
pub fn supported_languages(family: Family) -> &'static [&'static str] {
    match family {
        Family::Local => LOCAL_LANGUAGES,
        Family::OpenAI | Family::Anthropic | Family::Gemini => REMOTE_LANGUAGES,
    }
}

/// Resolve the effective language for `family`.
///
/// `family` is `None` when the caller could not map its input to a known
/// family; that case reports no fallback penalty.
pub fn resolve_language(family: Option<Family>, requested: Option<&str>) -> LanguageDecision {
    let Some(family) = family else {
        return LanguageDecision {
            supported: false,
            effective_language: DEFAULT_LANGUAGE.to_string(),
            needs_fallback: false,
        };
    };

    match requested {
        Some(code) if !code.is_empty() && supported_languages(family).iter().any(|c| *c == code) => {
            LanguageDecision {
                supported: true,
                effective_language: code.to_string(),
                needs_fallback: false,
            }
        }
        _ => LanguageDecision {
            supported: false,
            effective_language: DEFAULT_LANGUAGE.to_string(),
            needs_fallback: requested != Some(DEFAULT_LANGUAGE),
        },
    }
}

/// English name for a language code, used in prompt templates
pub fn language_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "nl" => "Dutch",
        "pl" => "Polish",
        "ru" => "Russian",
        "uk" => "Ukrainian",
        "tr" => "Turkish",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        "sv" => "Swedish",
        "da" => "Danish",
        "fi" => "Finnish",
        "no" => "Norwegian",
        "cs" => "Czech",
        "el" => "Greek",
        "he" => "Hebrew",
        "id" => "Indonesian",
        "vi" => "Vietnamese",
        "th" => "Thai",
        other => other,
    }
}
