//! Cross-cutting, shared constants.
//!
//! Prefer deriving secondary constants from primary ones to avoid drift.
//!
//! # Score Scales
//!
//! Every score that crosses a module boundary lives on `[0.0, 1.0]`: jointly normalized
//! retrieval scores, squashed cross-encoder scores, remapped cosine similarities and judge
//! verdicts. Percent-style inputs (0-100) are converted once at the boundary with
//! [`crate::judge::from_percent`].

pub const DEFAULT_DENSE_WEIGHT: f32 = 0.3;
pub const DEFAULT_DIVERSITY_PENALTY: f32 = 0.12;

/// Score assigned to every candidate when the joint score pool has no spread.
pub const NEUTRAL_SCORE: f32 = 0.5;

pub const DEFAULT_TOP_K: usize = 5;
pub const RETRIEVE_DEPTH_MULTIPLIER: usize = 3;
pub const MIN_RETRIEVE_DEPTH: usize = 10;

pub const DEFAULT_JUDGE_THRESHOLD: f32 = 0.70;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;
pub const JUDGE_SUPPORTED_FLOOR: f32 = 0.80;
pub const JUDGE_UNSUPPORTED_CAP: f32 = 0.70;
pub const JUDGE_SNIPPET_CHARS: usize = 200;
pub const JUDGE_MAX_TOKENS: u32 = 200;

pub const DEFAULT_MAX_CONTEXT_TOKENS: usize = 1200;
pub const DEFAULT_SNIPPET_CHARS: usize = 2000;
/// Rough characters-per-token ratio used for prompt budgeting.
pub const CHARS_PER_TOKEN: usize = 4;

pub const DEFAULT_GENERATION_MAX_TOKENS: u32 = 512;
pub const DEFAULT_GENERATION_TEMPERATURE: f32 = 0.0;
pub const CITATION_MAX_TOKENS: u32 = 250;

pub const DEFAULT_MAX_ANSWER_CHARS: usize = 3000;

pub const DEFAULT_COLLABORATOR_TIMEOUT_MS: u64 = 30_000;

/// Retrieval depth for a requested final size: `max(top_k * 3, 10)`.
#[inline]
pub fn retrieve_depth(top_k: usize) -> usize {
    top_k
        .saturating_mul(RETRIEVE_DEPTH_MULTIPLIER)
        .max(MIN_RETRIEVE_DEPTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieve_depth_has_floor() {
        assert_eq!(retrieve_depth(0), 10);
        assert_eq!(retrieve_depth(1), 10);
        assert_eq!(retrieve_depth(3), 10);
    }

    #[test]
    fn test_retrieve_depth_scales_with_top_k() {
        assert_eq!(retrieve_depth(4), 12);
        assert_eq!(retrieve_depth(5), 15);
        assert_eq!(retrieve_depth(20), 60);
    }

    #[test]
    fn test_judge_bounds_are_ordered() {
        assert!(JUDGE_UNSUPPORTED_CAP <= JUDGE_SUPPORTED_FLOOR);
        assert!((0.0..=1.0).contains(&DEFAULT_JUDGE_THRESHOLD));
    }
}
