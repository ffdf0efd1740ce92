use serde::{Deserialize, Serialize};

use crate::citation::CitationMethod;
use crate::judge::JudgeVerdict;
use crate::rerank::RerankTierKind;
use crate::types::RankedCandidate;

/// One generation and the verdict it received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Raw model output, before post-processing.
    pub answer: String,
    pub verdict: JudgeVerdict,
}

/// Compact reference to a context candidate, by rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based position in the context.
    pub rank: usize,
    pub chunk_id: Option<String>,
    pub page: Option<u32>,
}

impl Citation {
    pub fn for_context(candidates: &[RankedCandidate]) -> Vec<Citation> {
        candidates
            .iter()
            .enumerate()
            .map(|(i, c)| Citation {
                rank: i + 1,
                chunk_id: c.chunk.explicit_id().map(str::to_string),
                page: c.page(),
            })
            .collect()
    }
}

/// Extra detail returned when the request sets `debug`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugInfo {
    /// Fused, diversity-penalized list before reranking.
    pub retrieved: Vec<RankedCandidate>,
    /// First-attempt generation prompt.
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub document_id: String,
    pub query: String,
    pub refined_query: String,
    /// Context candidates, best first.
    pub candidates: Vec<RankedCandidate>,
    /// First attempt followed by every retry, in order.
    pub attempt_records: Vec<AttemptRecord>,
    /// Number of retries performed.
    pub attempts: u32,
    pub final_answer: String,
    pub citations: Vec<Citation>,
    pub citation_method: CitationMethod,
    pub rerank_tier: RerankTierKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

impl PipelineResult {
    /// Verdict of the attempt whose answer was kept.
    pub fn verdict(&self) -> Option<&JudgeVerdict> {
        self.final_attempt().map(|a| &a.verdict)
    }

    pub fn raw_answer(&self) -> Option<&str> {
        self.final_attempt().map(|a| a.answer.as_str())
    }

    pub fn final_attempt(&self) -> Option<&AttemptRecord> {
        self.attempt_records.last()
    }
}
