//! Context-window prompt construction.
//!
//! Candidates are included whole, in rank order, until the estimated token budget would
//! be exceeded; the first candidate that does not fit and everything after it is left out.

use std::fmt::Write as _;

use crate::constants::{CHARS_PER_TOKEN, DEFAULT_MAX_CONTEXT_TOKENS, DEFAULT_SNIPPET_CHARS};
use crate::text::truncate_chars;
use crate::types::RankedCandidate;

const ANSWER_INSTRUCTION: &str =
    "Answer the question using ONLY the provided context. If not present, say you don't know.";

/// Appended to the prompt when an answer is re-generated after a low judge score.
pub const RETRY_INSTRUCTION: &str = "\n\nThe previous answer was low confidence. Please re-check the context and produce a concise answer focusing only on facts present in the context.";

/// A built prompt and how much of the candidate list went into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextPrompt {
    pub text: String,
    /// Number of leading candidates included.
    pub included: usize,
    pub estimated_tokens: usize,
}

impl ContextPrompt {
    /// The same prompt with the low-confidence retry instruction appended.
    pub fn retry(&self) -> String {
        format!("{}{}", self.text, RETRY_INSTRUCTION)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptBuilder {
    max_context_tokens: usize,
    snippet_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            max_context_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }
}

impl PromptBuilder {
    pub fn new(max_context_tokens: usize) -> Self {
        Self {
            max_context_tokens,
            ..Self::default()
        }
    }

    pub fn with_snippet_chars(mut self, snippet_chars: usize) -> Self {
        self.snippet_chars = snippet_chars;
        self
    }

    pub fn max_context_tokens(&self) -> usize {
        self.max_context_tokens
    }

    /// `chars / 4`, the same rough estimate used for the budget.
    pub fn estimate_tokens(text: &str) -> usize {
        text.chars().count() / CHARS_PER_TOKEN
    }

    pub fn build(&self, query: &str, candidates: &[RankedCandidate]) -> ContextPrompt {
        let mut parts: Vec<String> = Vec::new();
        let mut used = 0usize;

        for (i, candidate) in candidates.iter().enumerate() {
            let snippet = truncate_chars(candidate.text(), self.snippet_chars);
            let tokens = Self::estimate_tokens(snippet);
            if used + tokens > self.max_context_tokens {
                break;
            }

            let page = candidate
                .page()
                .map(|p| p.to_string())
                .unwrap_or_else(|| "?".to_string());
            let mut part = String::with_capacity(snippet.len() + 16);
            let _ = write!(part, "[{}] (page={})\n{}", i + 1, page, snippet);
            parts.push(part);
            used += tokens;
        }

        let text = format!(
            "{ANSWER_INSTRUCTION}\n\nContext:\n{}\n\nQuestion: {query}\n\nAnswer:",
            parts.join("\n\n")
        );

        ContextPrompt {
            text,
            included: parts.len(),
            estimated_tokens: used,
        }
    }
}
