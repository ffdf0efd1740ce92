//! Final-answer cleanup.
//!
//! Applied once, to the chosen answer, in this order: boilerplate fences are stripped,
//! repeated sentences dropped, whitespace collapsed, then the text is hard-truncated.

use std::collections::HashSet;

use crate::constants::DEFAULT_MAX_ANSWER_CHARS;
use crate::text::{collapse_whitespace, truncate_chars};

pub const EMPTY_ANSWER: &str = "No answer could be generated.";
pub const TRUNCATION_MARKER: char = '…';

/// Start/end markers of instruction text models sometimes echo back. Matched
/// case-insensitively; everything from a start marker through the next end marker goes.
pub const BOILERPLATE_FENCES: &[(&str, &str)] = &[
    ("You are an AI assistant", "for this task."),
    (
        "Do not use information from previous questions and answers",
        "task.",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostProcessor {
    max_chars: usize,
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ANSWER_CHARS)
    }
}

impl PostProcessor {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn process(&self, answer: &str) -> String {
        let stripped = strip_fences(answer);
        let deduped = dedupe_sentences(&stripped);
        let collapsed = collapse_whitespace(&deduped);

        if collapsed.is_empty() {
            return EMPTY_ANSWER.to_string();
        }
        truncate_with_marker(&collapsed, self.max_chars)
    }
}

/// Removes every fenced boilerplate span. A start marker without a matching end marker
/// is left alone.
pub fn strip_fences(text: &str) -> String {
    let mut out = text.to_string();

    for (start, end) in BOILERPLATE_FENCES {
        let start = start.to_ascii_lowercase();
        let end = end.to_ascii_lowercase();
        let mut from = 0;

        // ASCII lowercasing keeps byte offsets aligned with `out`.
        loop {
            let lower = out.to_ascii_lowercase();
            let Some(s) = lower[from..].find(&start).map(|i| i + from) else {
                break;
            };
            let after_start = s + start.len();
            let Some(e) = lower[after_start..].find(&end).map(|i| i + after_start) else {
                break;
            };
            out.replace_range(s..e + end.len(), "");
            from = s;
        }
    }

    out
}

/// Splits after `.`, `!` or `?` followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut begin = 0;
    let mut prev_terminal = false;
    let mut in_gap = false;

    for (i, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if prev_terminal && !in_gap {
                sentences.push(&text[begin..i]);
                in_gap = true;
            }
            if in_gap {
                begin = i + ch.len_utf8();
            }
            continue;
        }
        in_gap = false;
        prev_terminal = matches!(ch, '.' | '!' | '?');
    }

    if begin < text.len() {
        sentences.push(&text[begin..]);
    }
    sentences
}

/// Keeps the first occurrence of each sentence, joined with single spaces.
pub fn dedupe_sentences(text: &str) -> String {
    let mut seen = HashSet::new();
    split_sentences(text.trim())
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty() && seen.insert(*s))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keeps `max_chars` characters and appends `…` when anything was cut.
pub fn truncate_with_marker(text: &str, max_chars: usize) -> String {
    let kept = truncate_chars(text, max_chars);
    if kept.len() == text.len() {
        return text.to_string();
    }
    let mut out = String::with_capacity(kept.len() + TRUNCATION_MARKER.len_utf8());
    out.push_str(kept);
    out.push(TRUNCATION_MARKER);
    out
}
