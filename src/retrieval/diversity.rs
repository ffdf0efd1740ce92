use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::constants::DEFAULT_DIVERSITY_PENALTY;
use crate::types::RankedCandidate;

/// Demotes repeat chunks from the same page so one page cannot fill the top-k.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiversityPenalizer {
    penalty: f32,
}

impl Default for DiversityPenalizer {
    fn default() -> Self {
        Self::new(DEFAULT_DIVERSITY_PENALTY)
    }
}

impl DiversityPenalizer {
    pub fn new(penalty: f32) -> Self {
        Self { penalty }
    }

    pub fn penalty(&self) -> f32 {
        self.penalty
    }

    /// Subtracts `penalty * (k - 1)` from the k-th occurrence of each known page, then
    /// re-sorts (stable). A list with fewer than two distinct known pages is returned as is.
    pub fn apply(&self, mut candidates: Vec<RankedCandidate>) -> Vec<RankedCandidate> {
        let distinct_pages: HashSet<u32> = candidates.iter().filter_map(|c| c.page()).collect();
        if distinct_pages.len() < 2 {
            return candidates;
        }

        let mut seen: HashMap<u32, u32> = HashMap::with_capacity(distinct_pages.len());
        let mut penalized = 0usize;

        for candidate in &mut candidates {
            let Some(page) = candidate.page() else {
                continue;
            };
            let count = seen.entry(page).or_insert(0);
            *count += 1;
            if *count > 1 {
                candidate.blended_score -= self.penalty * (*count - 1) as f32;
                penalized += 1;
            }
        }

        candidates.sort_by(|a, b| b.blended_score.total_cmp(&a.blended_score));

        debug!(
            pages = distinct_pages.len(),
            penalized,
            penalty = self.penalty,
            "Applied diversity penalty"
        );

        candidates
    }
}
