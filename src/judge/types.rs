use std::fmt;

use serde::{Deserialize, Serialize};

/// How a verdict's score was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JudgeMethod {
    /// Empty answer; no backend was consulted.
    NoAnswer,
    /// Overlap heuristic only; no judge model configured.
    Heuristic,
    /// Heuristic adjusted by the judge model's supported/unsupported call.
    Corroborated { supported: bool },
    /// The judge model was asked but failed; heuristic score used.
    CorroborationFailed,
}

impl JudgeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            JudgeMethod::NoAnswer => "no_answer",
            JudgeMethod::Heuristic => "heuristic",
            JudgeMethod::Corroborated { .. } => "corroborated",
            JudgeMethod::CorroborationFailed => "corroboration_failed",
        }
    }

    pub fn corroboration_ran(&self) -> bool {
        matches!(self, JudgeMethod::Corroborated { .. })
    }
}

impl fmt::Display for JudgeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reliability estimate for one generated answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeVerdict {
    /// Always within `[0, 1]`.
    pub score: f32,
    pub reason: String,
    /// Share of context candidates that share a token with the query.
    pub overlap: f32,
    pub method: JudgeMethod,
}

impl JudgeVerdict {
    pub fn new(score: f32, reason: impl Into<String>, overlap: f32, method: JudgeMethod) -> Self {
        Self {
            score: clamp_score(score),
            reason: reason.into(),
            overlap: clamp_score(overlap),
            method,
        }
    }

    pub fn no_answer() -> Self {
        Self::new(0.0, "no answer provided", 0.0, JudgeMethod::NoAnswer)
    }

    pub fn passes(&self, threshold: f32) -> bool {
        self.score >= threshold
    }

    /// Score on the 0–100 scale.
    pub fn percent(&self) -> u8 {
        super::to_percent(self.score)
    }
}

impl fmt::Display for JudgeVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} ({}): {}", self.score, self.method, self.reason)
    }
}

/// Clamps into `[0, 1]`; NaN becomes `0.0`.
pub fn clamp_score(score: f32) -> f32 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}
