//! Two-tier JSON recovery for chat-model responses.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::ExtractionError;

/// Parse a response that should be a JSON object.
///
/// The whole text is tried first. Models often wrap the object in prose or
/// markdown fences, so the second attempt takes everything from the first
/// `{` to the last `}`. There is no third attempt.
pub fn parse_llm_json(text: &str) -> Result<Map<String, Value>, ExtractionError> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => return Ok(map),
        Ok(other) => debug!("Response parsed but is not an object: {}", type_name(&other)),
        Err(e) => debug!("Strict parse failed: {}", e),
    }

    if let Some(candidate) = brace_span(text) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => {
                warn!(
                    stripped = text.len() - candidate.len(),
                    "Recovered JSON object from surrounding text"
                );
                return Ok(map);
            }
            Ok(_) => {}
            Err(e) => debug!("Bracket recovery failed: {}", e),
        }
    }

    Err(ExtractionError::MalformedLlmResponse {
        raw: text.to_string(),
    })
}

/// Substring from the first `{` to the last `}`, inclusive.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_strict_object() {
        let map = parse_llm_json(r#"{"a": 1, "b": [true]}"#).unwrap();
        assert_eq!(Value::Object(map), json!({"a": 1, "b": [true]}));
    }

    #[test]
    fn test_recovers_from_prose() {
        let map = parse_llm_json("Sure! Here is the JSON: {\"a\":1} Hope that helps.").unwrap();
        assert_eq!(Value::Object(map), json!({"a": 1}));
    }

    #[test]
    fn test_recovers_from_markdown_fence() {
        let text = "```json\n{\"invoice\": {\"no\": \"A-1\"}}\n```";
        let map = parse_llm_json(text).unwrap();
        assert_eq!(Value::Object(map), json!({"invoice": {"no": "A-1"}}));
    }

    #[test]
    fn test_no_braces_is_malformed() {
        let err = parse_llm_json("I could not read the invoice.").unwrap_err();
        assert_eq!(
            err,
            ExtractionError::MalformedLlmResponse {
                raw: "I could not read the invoice.".to_string()
            }
        );
        assert_eq!(err.raw_response(), Some("I could not read the invoice."));
    }

    #[test]
    fn test_broken_json_between_braces_is_malformed() {
        let text = "Result: {\"a\": 1,, } and {oops}";
        assert!(matches!(
            parse_llm_json(text),
            Err(ExtractionError::MalformedLlmResponse { .. })
        ));
    }

    #[test]
    fn test_reversed_braces_is_malformed() {
        assert!(parse_llm_json("} nothing {").is_err());
    }

    #[test]
    fn test_top_level_array_is_rejected() {
        assert!(parse_llm_json("[1, 2, 3]").is_err());
    }
}
