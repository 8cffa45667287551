//! Grading criteria: named evaluation dimensions with descriptions.

use crate::error::AnalyzerError;
use serde_json::Value;

/// Built-in criteria used when the caller supplies none, in prompt order.
pub const DEFAULT_CRITERIA: [(&str, &str); 5] = [
    (
        "Clarity",
        "Is the writing clear, concise, and easy to understand? Avoids jargon and ambiguity.",
    ),
    (
        "Correctness",
        "Is the information presented accurate? Are grammar, spelling, and punctuation correct?",
    ),
    (
        "Completeness",
        "Does the document cover the topic adequately? Are there any significant omissions?",
    ),
    (
        "Structure",
        "Is the document well-organized with a logical flow? Are headings and paragraphs used effectively?",
    ),
    (
        "Engagement",
        "Is the content engaging and interesting to the target audience (teachers/students)?",
    ),
];

/// An ordered set of `(name, description)` pairs with unique names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criteria {
    entries: Vec<(String, String)>,
}

impl Default for Criteria {
    fn default() -> Self {
        Self {
            entries: DEFAULT_CRITERIA
                .iter()
                .map(|(name, desc)| (name.to_string(), desc.to_string()))
                .collect(),
        }
    }
}

impl Criteria {
    /// Build from pairs; a repeated name keeps its first position and last
    /// description.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut entries: Vec<(String, String)> = Vec::new();
        for (k, v) in pairs {
            let (k, v) = (k.into(), v.into());
            match entries.iter_mut().find(|(name, _)| *name == k) {
                Some(existing) => existing.1 = v,
                None => entries.push((k, v)),
            }
        }
        Self { entries }
    }

    /// Parse the raw `criteria` form field.
    ///
    /// The field must be a JSON object whose values are all strings.
    pub fn from_json(raw: &str) -> Result<Self, AnalyzerError> {
        let value: Value = serde_json::from_str(raw).map_err(|_| AnalyzerError::InvalidCriteria {
            reason: "Criteria is not a valid JSON string.".into(),
        })?;

        let Value::Object(map) = value else {
            return Err(AnalyzerError::InvalidCriteria {
                reason: "Criteria must be a valid JSON object string.".into(),
            });
        };

        let mut pairs = Vec::with_capacity(map.len());
        for (name, desc) in map {
            match desc {
                Value::String(s) => pairs.push((name, s)),
                other => {
                    return Err(AnalyzerError::InvalidCriteria {
                        reason: format!(
                            "description for '{name}' must be a string, got {}",
                            json_type_name(&other)
                        ),
                    })
                }
            }
        }
        Ok(Self::from_pairs(pairs))
    }

    /// Parse an optional raw field; absent or blank input yields `None`.
    pub fn parse_optional(raw: Option<&str>) -> Result<Option<Self>, AnalyzerError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Self::from_json(raw).map(Some),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_five_in_order() {
        let c = Criteria::default();
        let names: Vec<&str> = c.names().collect();
        assert_eq!(
            names,
            ["Clarity", "Correctness", "Completeness", "Structure", "Engagement"]
        );
    }

    #[test]
    fn parses_object_of_strings() {
        let c = Criteria::from_json(r#"{"clarity": "Is it clear?", "depth": "Is it deep?"}"#)
            .unwrap();
        assert_eq!(c.len(), 2);
        assert!(c.iter().any(|(n, d)| n == "depth" && d == "Is it deep?"));
    }

    #[test]
    fn array_is_rejected() {
        let err = Criteria::from_json(r#"["Clarity", "Structure"]"#).unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidCriteria { .. }));
        assert_eq!(
            err.public_message(),
            "Invalid criteria format: Criteria must be a valid JSON object string."
        );
    }

    #[test]
    fn invalid_json_is_rejected() {
        let err = Criteria::from_json("{not json").unwrap_err();
        assert_eq!(
            err.public_message(),
            "Invalid criteria format: Criteria is not a valid JSON string."
        );
    }

    #[test]
    fn non_string_description_is_rejected() {
        let err = Criteria::from_json(r#"{"Clarity": 5}"#).unwrap_err();
        assert!(err.public_message().contains("'Clarity'"), "got: {err}");
    }

    #[test]
    fn blank_field_is_absent() {
        assert_eq!(Criteria::parse_optional(None).unwrap(), None);
        assert_eq!(Criteria::parse_optional(Some("  ")).unwrap(), None);
    }

    #[test]
    fn duplicate_names_keep_last_description() {
        let c = Criteria::from_pairs([("A", "one"), ("B", "two"), ("A", "three")]);
        let pairs: Vec<(&str, &str)> = c.iter().collect();
        assert_eq!(pairs, [("A", "three"), ("B", "two")]);
    }
}
