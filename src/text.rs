//! Small text helpers shared by the judge, the citer and post-processing.

use std::collections::HashSet;

/// Lowercased whitespace tokens of `text`.
pub fn token_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Returns `true` if `text` contains at least one token of `query_tokens`.
pub fn shares_token(query_tokens: &HashSet<String>, text: &str) -> bool {
    if query_tokens.is_empty() {
        return false;
    }
    text.split_whitespace()
        .any(|token| query_tokens.contains(&token.to_lowercase()))
}

/// Returns at most `max_chars` characters of `text` (never splits a code point).
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Replaces every whitespace run with a single space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_set_lowercases() {
        let tokens = token_set("What  is\tAI?");
        assert!(tokens.contains("what"));
        assert!(tokens.contains("is"));
        assert!(tokens.contains("ai?"));
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_shares_token_is_case_insensitive() {
        let query = token_set("machine LEARNING");
        assert!(shares_token(&query, "Learning rates matter"));
        assert!(!shares_token(&query, "Deep networks"));
    }

    #[test]
    fn test_shares_token_empty_query() {
        assert!(!shares_token(&HashSet::new(), "anything at all"));
    }

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\n b\t c  "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }
}
