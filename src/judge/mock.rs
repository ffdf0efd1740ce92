use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Judge, JudgeMethod, JudgeVerdict};
use crate::types::RankedCandidate;

/// Returns queued scores in order, then repeats the last one. Records every answer judged.
#[derive(Debug, Default)]
pub struct ScriptedJudge {
    scores: Mutex<VecDeque<f32>>,
    last: Mutex<Option<f32>>,
    answers: Mutex<Vec<String>>,
}

impl ScriptedJudge {
    pub fn new<I: IntoIterator<Item = f32>>(scores: I) -> Self {
        Self {
            scores: Mutex::new(scores.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn answers(&self) -> Vec<String> {
        self.answers.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.answers.lock().len()
    }
}

#[async_trait]
impl Judge for ScriptedJudge {
    async fn judge(
        &self,
        _query: &str,
        answer: &str,
        _candidates: &[RankedCandidate],
    ) -> JudgeVerdict {
        self.answers.lock().push(answer.to_string());

        let next = self.scores.lock().pop_front();
        let score = {
            let mut last = self.last.lock();
            if let Some(s) = next {
                *last = Some(s);
            }
            last.unwrap_or(0.0)
        };

        JudgeVerdict::new(
            score,
            format!("scripted score {:.2}", score),
            score,
            JudgeMethod::Heuristic,
        )
    }
}
