//! Permissive extraction of structured (JSON) fragments from free model output.
//!
//! Models asked for JSON often wrap it in prose or code fences, or emit a draft object
//! followed by a corrected one. The rule shared by every caller: scan left to right for
//! `{` or `[`, try to read one complete JSON value from there, and record it; the
//! **last** well-formed fragment wins. Malformed text yields `None`, never an error.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Every well-formed top-level JSON object or array in `text`, in order of appearance.
///
/// Fragments nested inside an earlier fragment are not reported separately.
pub fn structured_fragments(text: &str) -> Vec<Value> {
    let mut fragments = Vec::new();
    let mut pos = 0usize;

    while let Some(offset) = text[pos..].find(['{', '[']) {
        let start = pos + offset;
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();

        match stream.next() {
            Some(Ok(value)) => {
                let consumed = stream.byte_offset();
                fragments.push(value);
                pos = start + consumed.max(1);
            }
            _ => pos = start + 1,
        }
    }

    fragments
}

/// The last well-formed JSON object or array in `text`.
pub fn last_structured(text: &str) -> Option<Value> {
    structured_fragments(text).pop()
}

/// The last fragment that deserializes into `T`.
///
/// Earlier fragments are tried when later ones have the wrong shape, so a trailing
/// unrelated object does not hide the answer.
pub fn last_structured_as<T: DeserializeOwned>(text: &str) -> Option<T> {
    structured_fragments(text)
        .into_iter()
        .rev()
        .find_map(|value| serde_json::from_value(value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Verdict {
        supported: bool,
    }

    #[test]
    fn test_clean_json() {
        assert_eq!(
            last_structured(r#"{"supported": true}"#),
            Some(json!({"supported": true}))
        );
    }

    #[test]
    fn test_json_wrapped_in_prose_and_fences() {
        let text = "Sure! Here you go:\n```json\n{\"supported\": false, \"reason\": \"n/a\"}\n```\nHope that helps.";
        assert_eq!(
            last_structured(text),
            Some(json!({"supported": false, "reason": "n/a"}))
        );
    }

    #[test]
    fn test_last_fragment_wins() {
        let text = r#"Draft: {"supported": false} Final: {"supported": true}"#;
        assert_eq!(last_structured(text), Some(json!({"supported": true})));
        assert_eq!(structured_fragments(text).len(), 2);
    }

    #[test]
    fn test_nested_values_are_not_separate_fragments() {
        let text = r#"{"citations": [{"chunk_id": "a"}], "reason": "x"}"#;
        assert_eq!(structured_fragments(text).len(), 1);
    }

    #[test]
    fn test_arrays_are_fragments() {
        assert_eq!(
            last_structured(r#"Sub-queries: ["a", "b"]"#),
            Some(json!(["a", "b"]))
        );
    }

    #[test]
    fn test_malformed_text_yields_none() {
        assert_eq!(last_structured("no json here"), None);
        assert_eq!(last_structured("{ broken: json "), None);
        assert_eq!(last_structured(""), None);
    }

    #[test]
    fn test_malformed_tail_keeps_earlier_fragment() {
        let text = r#"{"supported": true} and then {"supported": "#;
        assert_eq!(last_structured(text), Some(json!({"supported": true})));
    }

    #[test]
    fn test_brace_inside_string_is_not_a_fragment_start() {
        let text = r#"{"reason": "uses { and [ inside"}"#;
        assert_eq!(structured_fragments(text).len(), 1);
    }

    #[test]
    fn test_typed_lookup_skips_wrong_shapes() {
        let text = r#"{"supported": true} {"unrelated": 1}"#;
        assert_eq!(
            last_structured_as::<Verdict>(text),
            Some(Verdict { supported: true })
        );
        assert_eq!(last_structured_as::<Verdict>(r#"{"unrelated": 1}"#), None);
    }

    #[test]
    fn test_multibyte_text_is_handled() {
        let text = "Résumé → {\"supported\": true} ✓";
        assert_eq!(last_structured(text), Some(json!({"supported": true})));
    }
}
