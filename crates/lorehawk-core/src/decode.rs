//! Lenient decoding of completion-service output.
//!
//! Models wrap JSON in prose or code fences often enough that every
//! structured stage goes through these helpers instead of a strict
//! deserialize.

use serde_json::Value;

/// Slice out the first JSON object or array in a blob of model output.
pub(crate) fn extract_json_block(text: &str) -> Option<&str> {
    let object = text
        .find('{')
        .and_then(|start| text.rfind('}').filter(|end| *end > start).map(|end| (start, end)));
    let array = text
        .find('[')
        .and_then(|start| text.rfind(']').filter(|end| *end > start).map(|end| (start, end)));

    let (start, end) = match (object, array) {
        (Some(o), Some(a)) => {
            if o.0 < a.0 {
                o
            } else {
                a
            }
        }
        (Some(o), None) => o,
        (None, Some(a)) => a,
        (None, None) => return None,
    };
    Some(&text[start..=end])
}

/// Non-empty trimmed string field, or `None`.
pub(crate) fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Coerce any JSON value into a 0-100 score; non-numeric becomes 0.
pub(crate) fn coerce_score(value: &Value) -> u8 {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.map(clamp_percentage).unwrap_or(0)
}

pub(crate) fn clamp_percentage(raw: f64) -> u8 {
    raw.clamp(0.0, 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_object_from_fenced_output() {
        let text = "Here you go:\n```json\n{\"score\": 80}\n```\nHope that helps.";
        assert_eq!(extract_json_block(text), Some("{\"score\": 80}"));
    }

    #[test]
    fn extracts_array_when_it_comes_first() {
        let text = "[{\"year\": \"1905\"}] trailing {noise}";
        let block = extract_json_block(text).unwrap();
        assert!(block.starts_with('['));
        assert!(block.ends_with(']'));
    }

    #[test]
    fn no_json_yields_none() {
        assert_eq!(extract_json_block("plain prose only"), None);
        assert_eq!(extract_json_block(""), None);
    }

    #[test]
    fn coerce_score_handles_shapes() {
        assert_eq!(coerce_score(&json!(85)), 85);
        assert_eq!(coerce_score(&json!(85.6)), 86);
        assert_eq!(coerce_score(&json!("72")), 72);
        assert_eq!(coerce_score(&json!("not a number")), 0);
        assert_eq!(coerce_score(&json!(null)), 0);
        assert_eq!(coerce_score(&json!(250)), 100);
        assert_eq!(coerce_score(&json!(-4)), 0);
    }

    #[test]
    fn string_field_rejects_blank() {
        let value = json!({"title": "  ", "year": "1905"});
        assert!(string_field(&value, "title").is_none());
        assert_eq!(string_field(&value, "year").as_deref(), Some("1905"));
        assert!(string_field(&value, "missing").is_none());
    }
}
