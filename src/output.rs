//! Result and response types.

use crate::error::AnalyzerError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Outcome of grading one document.
///
/// `scores` keeps the values exactly as the model returned them;
/// `overall_score` is the mean of the numeric ones and is `null` when there
/// are none.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub feedback: String,
    pub scores: Map<String, Value>,
    pub overall_score: Option<f64>,
}

/// `{code, message, data}` wrapper used for every HTTP reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope<T = Value> {
    pub code: u16,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ResponseEnvelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "Success".to_string(),
            data,
        }
    }
}

impl ResponseEnvelope<Value> {
    /// Error envelope; `data` is always an empty object.
    pub fn error(err: &AnalyzerError) -> Self {
        Self {
            code: err.code(),
            message: err.public_message(),
            data: Value::Object(Map::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_shape() {
        let result = AnalysisResult {
            feedback: "Well argued.".into(),
            scores: match json!({"Clarity": 90}) {
                Value::Object(m) => m,
                _ => unreachable!(),
            },
            overall_score: Some(90.0),
        };
        let v = serde_json::to_value(ResponseEnvelope::success(result)).unwrap();
        assert_eq!(
            v,
            json!({
                "code": 200,
                "message": "Success",
                "data": {"feedback": "Well argued.", "scores": {"Clarity": 90}, "overall_score": 90.0}
            })
        );
    }

    #[test]
    fn absent_overall_score_is_null() {
        let result = AnalysisResult {
            feedback: String::new(),
            scores: Map::new(),
            overall_score: None,
        };
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["overall_score"], Value::Null);
    }

    #[test]
    fn error_envelope_has_empty_data() {
        let err = AnalyzerError::MissingField { field: "file" };
        let v = serde_json::to_value(ResponseEnvelope::<Value>::error(&err)).unwrap();
        assert_eq!(v["code"], 400);
        assert_eq!(v["data"], json!({}));
        assert_eq!(
            v["message"],
            "Bad request: missing required form field 'file'"
        );
    }
}
