//! Deterministic token estimator (C1).
//!
//! This is not a real tokenizer for any specific model; it is the same
//! chars-per-token heuristic used throughout agent tooling for cheap,
//! dependency-free, *stable* token accounting (no model-specific vocab to
//! keep in sync). Determinism matters more than precision here: the same
//! input must always produce the same estimate so that cumulative-token
//! graphs and compression reduction percentages are reproducible.

use serde_json::Value;

/// Average characters per token for English-ish text and JSON payloads.
const CHARS_PER_TOKEN: f64 = 4.0;

/// Estimate the token count of a plain string.
pub fn estimate_tokens(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }
    let chars = text.chars().count() as f64;
    (chars / CHARS_PER_TOKEN).ceil() as u32
}

/// Estimate the token count of a structured JSON value by estimating its
/// compact serialized form.
pub fn estimate_tokens_value(value: &Value) -> u32 {
    match value {
        Value::String(s) => estimate_tokens(s),
        Value::Null => 0,
        _ => estimate_tokens(&value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_string_is_zero_tokens() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn estimate_is_deterministic() {
        let text = "the quick brown fox jumps over the lazy dog";
        assert_eq!(estimate_tokens(text), estimate_tokens(text));
    }

    #[test]
    fn longer_text_yields_more_tokens() {
        let short = estimate_tokens("hello");
        let long = estimate_tokens("hello there, this is a much longer message");
        assert!(long > short);
    }

    #[test]
    fn json_value_estimate_uses_serialized_form() {
        let value = json!({"command": "ls -la", "timeout": 5000});
        let expected = estimate_tokens(&value.to_string());
        assert_eq!(estimate_tokens_value(&value), expected);
    }

    #[test]
    fn json_string_value_estimate_uses_bare_string() {
        let value = json!("hello world");
        assert_eq!(estimate_tokens_value(&value), estimate_tokens("hello world"));
    }
}
