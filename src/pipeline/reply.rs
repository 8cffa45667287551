//! Reply handling: clean up and validate the raw LLM completion.
//!
//! Providers asked for "JSON only" still sometimes wrap the object in a
//! ```` ```json ```` fence or prefix it with a byte-order mark. Those wrappers
//! are removed by [`normalise_reply`] before the text is parsed. Everything
//! beyond that is strict: a reply that is not a JSON object with `feedback`
//! and an object-valued `scores` is rejected whole.

use crate::error::AnalyzerError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Parsed reply before score aggregation. Score values are kept exactly as
/// the model sent them.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAnalysis {
    pub feedback: String,
    pub scores: Map<String, Value>,
}

// ── Normalisation ────────────────────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?[ \t]*\n(.*)\n```\s*$").unwrap());

/// Strip invisible characters, surrounding whitespace and one outer code
/// fence.
pub fn normalise_reply(input: &str) -> String {
    let s = remove_invisible_chars(input);
    let s = s.trim();
    match RE_OUTER_FENCES.captures(s) {
        Some(caps) => caps[1].trim().to_string(),
        None => s.to_string(),
    }
}

fn remove_invisible_chars(input: &str) -> String {
    input.replace(['\u{200B}', '\u{FEFF}', '\u{200C}', '\u{200D}', '\u{2060}'], "")
}

// ── Validation ───────────────────────────────────────────────────────────────

/// Parse and validate a completion.
///
/// Fails with [`AnalyzerError::MalformedReply`] when the text is not JSON,
/// is not an object, lacks `feedback` or `scores`, or when `scores` is not
/// an object.
pub fn parse_reply(raw: &str) -> Result<RawAnalysis, AnalyzerError> {
    let cleaned = normalise_reply(raw);
    let value: Value = serde_json::from_str(&cleaned).map_err(|e| AnalyzerError::MalformedReply {
        detail: format!("not valid JSON: {e}"),
    })?;

    let Value::Object(mut obj) = value else {
        return Err(AnalyzerError::MalformedReply {
            detail: "top-level value is not an object".into(),
        });
    };

    let feedback = match obj.remove("feedback") {
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => {
            return Err(AnalyzerError::MalformedReply {
                detail: "missing 'feedback' key".into(),
            })
        }
    };

    let scores = match obj.remove("scores") {
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(AnalyzerError::MalformedReply {
                detail: "'scores' is not an object".into(),
            })
        }
        None => {
            return Err(AnalyzerError::MalformedReply {
                detail: "missing 'scores' key".into(),
            })
        }
    };

    Ok(RawAnalysis { feedback, scores })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_object_parses() {
        let r = parse_reply(r#"{"feedback": "Good work.", "scores": {"Clarity": 90}}"#).unwrap();
        assert_eq!(r.feedback, "Good work.");
        assert_eq!(r.scores.get("Clarity"), Some(&json!(90)));
    }

    #[test]
    fn fenced_reply_is_unwrapped() {
        let raw = "```json\n{\"feedback\": \"ok\", \"scores\": {}}\n```\n";
        let r = parse_reply(raw).unwrap();
        assert_eq!(r.feedback, "ok");
        assert!(r.scores.is_empty());
    }

    #[test]
    fn bare_fence_and_bom_are_stripped() {
        let raw = "\u{FEFF}```\n{\"feedback\": \"x\", \"scores\": {\"A\": \"75\"}}\n```";
        let r = parse_reply(raw).unwrap();
        assert_eq!(r.scores.get("A"), Some(&json!("75")));
    }

    #[test]
    fn score_values_pass_through_untouched() {
        let r = parse_reply(r#"{"feedback": "", "scores": {"A": "n/a", "B": true, "C": 7.5}}"#)
            .unwrap();
        assert_eq!(r.scores.get("A"), Some(&json!("n/a")));
        assert_eq!(r.scores.get("B"), Some(&json!(true)));
        assert_eq!(r.scores.get("C"), Some(&json!(7.5)));
    }

    #[test]
    fn non_json_is_rejected() {
        let err = parse_reply("Sure! Here is my feedback: great essay.").unwrap_err();
        assert!(matches!(err, AnalyzerError::MalformedReply { .. }));
        assert_eq!(err.public_message(), "LLM analysis error");
    }

    #[test]
    fn missing_keys_are_rejected() {
        assert!(parse_reply(r#"{"scores": {"A": 1}}"#).is_err());
        assert!(parse_reply(r#"{"feedback": "hi"}"#).is_err());
    }

    #[test]
    fn scores_must_be_object() {
        let err = parse_reply(r#"{"feedback": "hi", "scores": [90, 80]}"#).unwrap_err();
        assert!(err.to_string().contains("'scores'"), "got: {err}");
    }

    #[test]
    fn array_reply_is_rejected() {
        assert!(parse_reply("[1, 2, 3]").is_err());
    }

    #[test]
    fn non_string_feedback_is_rendered() {
        let r = parse_reply(r#"{"feedback": ["a", "b"], "scores": {}}"#).unwrap();
        assert_eq!(r.feedback, r#"["a","b"]"#);
    }
}
