//! Prompts sent to the LLM when grading a document.
//!
//! All prompt text lives here so it can be inspected by unit tests without a
//! live provider. Callers can override the system prompt via
//! [`crate::config::AnalyzerConfig::system_prompt`]; the user prompt is always
//! rendered by [`build_prompt`].

use crate::criteria::Criteria;

/// Default system prompt establishing the evaluator role.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful teaching assistant providing document feedback and grading.";

/// Appended to the system prompt when a JSON reply is requested.
pub const JSON_RESPONSE_HINT: &str =
    "Respond with a single valid JSON object and nothing else.";

/// Marker appended to document text that was cut at the character limit.
pub const TRUNCATION_MARKER: &str = "\n... [Content Truncated]";

/// Feedback returned, without calling the LLM, for documents with no text.
pub const EMPTY_DOCUMENT_FEEDBACK: &str =
    "The document appears to be empty or could not be read properly. No analysis performed.";

/// Cut `text` to at most `max_chars` characters, appending
/// [`TRUNCATION_MARKER`] when anything was removed.
///
/// Counts Unicode scalar values, so multi-byte text is never split inside a
/// character.
pub fn truncate_document(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// Render the criteria as `- name: description` lines.
pub fn render_criteria(criteria: &Criteria) -> String {
    criteria
        .iter()
        .map(|(name, desc)| format!("- {name}: {desc}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the user prompt for grading `text` against `criteria`.
///
/// Pure and deterministic: the same inputs always yield the same prompt.
pub fn build_prompt(text: &str, criteria: &Criteria, max_chars: usize) -> String {
    let content = truncate_document(text, max_chars);
    let criteria_str = render_criteria(criteria);
    format!(
        r#"Please act as a teaching assistant. Analyze the following document content based on the provided criteria.

**Document Content:**
{content}

**Grading Criteria:**
{criteria_str}

**Instructions:**
1. Provide constructive, specific feedback addressing strengths and weaknesses based on the criteria. If the document content is very short, state that analysis is limited.
2. For each criterion listed above, provide a score from 0 to 100. Assign lower scores (e.g., 0) if the content is insufficient for evaluation.
3. Format your response as a JSON object with exactly two keys: 'feedback' (string) and 'scores' (an object where keys are the criteria names and values are numeric scores).
   Example JSON format: {{"feedback": "Overall feedback here...", "scores": {{"Clarity": 85, "Correctness": 92, ...}}}}

**Response (JSON format only):**
"#
    )
}

/// Build the system message, adding the JSON hint when requested.
pub fn system_message(base: &str, json_response: bool) -> String {
    if json_response {
        format!("{base}\n\n{JSON_RESPONSE_HINT}")
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_text_and_criteria_lines() {
        let criteria = Criteria::from_pairs([("Clarity", "Is it clear?")]);
        let p = build_prompt("The mitochondria is the powerhouse.", &criteria, 1000);
        assert!(p.contains("act as a teaching assistant"));
        assert!(p.contains("The mitochondria is the powerhouse."));
        assert!(p.contains("- Clarity: Is it clear?"));
        assert!(p.contains("'feedback'"));
        assert!(p.contains("'scores'"));
        assert!(!p.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn prompt_is_deterministic() {
        let c = Criteria::default();
        assert_eq!(build_prompt("abc", &c, 10), build_prompt("abc", &c, 10));
    }

    #[test]
    fn default_criteria_render_in_order() {
        let rendered = render_criteria(&Criteria::default());
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("- Clarity: "));
        assert!(lines[4].starts_with("- Engagement: "));
    }

    #[test]
    fn long_text_is_truncated_with_marker() {
        let text = "a".repeat(50);
        let out = truncate_document(&text, 10);
        assert_eq!(out, format!("{}{}", "a".repeat(10), TRUNCATION_MARKER));
    }

    #[test]
    fn text_at_limit_is_untouched() {
        let text = "b".repeat(10);
        assert_eq!(truncate_document(&text, 10), text);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "éééééé";
        let out = truncate_document(text, 3);
        assert!(out.starts_with("ééé"));
        assert!(out.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn system_message_hint() {
        assert!(system_message("base", true).ends_with(JSON_RESPONSE_HINT));
        assert_eq!(system_message("base", false), "base");
    }
}
