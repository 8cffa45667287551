//! Overall score: arithmetic mean of the numerically usable per-criterion
//! scores.

use serde_json::{Map, Value};

/// Coerce a single score value to a finite number.
///
/// Numbers and numeric strings (surrounding whitespace allowed) count.
/// Booleans, null, arrays and objects do not.
pub fn coerce_score(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Mean of every coercible value in `scores`, or `None` when there are none.
pub fn aggregate(scores: &Map<String, Value>) -> Option<f64> {
    let (sum, count) = scores
        .values()
        .filter_map(coerce_score)
        .fold((0.0_f64, 0_usize), |(sum, count), n| (sum + n, count + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn mean_of_numbers() {
        assert_eq!(aggregate(&map(json!({"A": 80, "B": 60}))), Some(70.0));
    }

    #[test]
    fn single_score() {
        assert_eq!(aggregate(&map(json!({"Clarity": 90}))), Some(90.0));
    }

    #[test]
    fn non_numeric_entries_are_skipped() {
        assert_eq!(
            aggregate(&map(json!({"A": 80, "B": "bad", "C": 60}))),
            Some(70.0)
        );
    }

    #[test]
    fn numeric_strings_count() {
        assert_eq!(aggregate(&map(json!({"A": "85", "B": " 75.5 "}))), Some(80.25));
    }

    #[test]
    fn nothing_coercible_is_absent() {
        assert_eq!(aggregate(&map(json!({}))), None);
        assert_eq!(
            aggregate(&map(json!({"A": "n/a", "B": null, "C": true, "D": [1]}))),
            None
        );
    }

    #[test]
    fn non_finite_strings_are_ignored() {
        assert_eq!(coerce_score(&json!("NaN")), None);
        assert_eq!(coerce_score(&json!("inf")), None);
        assert_eq!(coerce_score(&json!(-5)), Some(-5.0));
    }

    #[test]
    fn zeros_average_to_zero() {
        assert_eq!(aggregate(&map(json!({"A": 0, "B": 0}))), Some(0.0));
    }
}
