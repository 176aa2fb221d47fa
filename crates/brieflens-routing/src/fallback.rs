//! Declarative fallback table

use brieflens_core::{Family, ProviderRegistry};
use tracing::debug;

/// Candidates tried, in order, after a model of the keyed family fails.
///
/// Each list names one representative of every other family.
const FALLBACK_TABLE: [(Family, [&str; 3]); 4] = [
    (
        Family::Local,
        ["gpt-4o-mini", "gemini-2.0-flash", "claude-3-5-haiku"],
    ),
    (
        Family::OpenAI,
        ["on-device", "gemini-2.0-flash", "claude-3-5-haiku"],
    ),
    (
        Family::Anthropic,
        ["on-device", "gpt-4o-mini", "gemini-2.0-flash"],
    ),
    (
        Family::Gemini,
        ["on-device", "gpt-4o-mini", "claude-3-5-haiku"],
    ),
];

pub struct FallbackPlanner;

impl FallbackPlanner {
    /// Ordered fallback model ids for a failed primary.
    ///
    /// Unknown primaries get no fallbacks. Local candidates are dropped when
    /// the runtime cannot run them.
    pub fn plan(primary_model_id: &str, local_supported: bool) -> Vec<&'static str> {
        let Some(primary) = ProviderRegistry::lookup(primary_model_id) else {
            debug!(primary = primary_model_id, "Unknown primary model, no fallbacks");
            return Vec::new();
        };

        FALLBACK_TABLE
            .iter()
            .find(|(family, _)| *family == primary.family)
            .map(|(_, candidates)| {
                candidates
                    .iter()
                    .copied()
                    .filter(|id| {
                        local_supported
                            || ProviderRegistry::lookup(id)
                                .is_some_and(|model| model.family != Family::Local)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
