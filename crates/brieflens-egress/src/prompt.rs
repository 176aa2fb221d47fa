//! Instruction template shared by the remote families

use brieflens_core::language::language_name;

/// Maximum number of content characters embedded in a request
pub const MAX_CONTENT_CHARS: usize = 12_000;

/// The first `MAX_CONTENT_CHARS` characters of `content`
pub fn truncate_content(content: &str) -> &str {
    match content.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

/// Build the summarization prompt for `language` around truncated content.
///
/// The content is always the last thing in the prompt.
pub fn build_prompt(content: &str, language: &str) -> String {
    format!(
        "Summarize the following web page content as exactly five bullet points written in {language}. \
         Respond with only the five bullet points, one per line, each starting with \"- \". \
         Do not add a title, introduction, conclusion, or any other text.\n\n\
         Content:\n{content}",
        language = language_name(language),
        content = truncate_content(content),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_content_untouched() {
        assert_eq!(truncate_content("short"), "short");
        assert_eq!(truncate_content(""), "");
    }

    #[test]
    fn test_truncates_to_exact_prefix() {
        let content = format!("{}TAIL", "a".repeat(MAX_CONTENT_CHARS));
        let truncated = truncate_content(&content);
        assert_eq!(truncated.chars().count(), MAX_CONTENT_CHARS);
        assert!(content.starts_with(truncated));
        assert!(!truncated.contains("TAIL"));
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let content = "é".repeat(MAX_CONTENT_CHARS + 5);
        let truncated = truncate_content(&content);
        assert_eq!(truncated.chars().count(), MAX_CONTENT_CHARS);
        assert_eq!(truncated.len(), MAX_CONTENT_CHARS * 2);
    }

    #[test]
    fn test_prompt_names_language_and_ends_with_content() {
        let prompt = build_prompt("The page body.", "es");
        assert!(prompt.contains("written in Spanish"));
        assert!(prompt.contains("five bullet points"));
        assert!(prompt.ends_with("Content:\nThe page body."));
    }

    #[test]
    fn test_prompt_embeds_truncated_content() {
        let content = "b".repeat(MAX_CONTENT_CHARS + 100);
        let prompt = build_prompt(&content, "en");
        assert!(prompt.ends_with(truncate_content(&content)));
        assert!(!prompt.contains(&"b".repeat(MAX_CONTENT_CHARS + 1)));
    }
}
