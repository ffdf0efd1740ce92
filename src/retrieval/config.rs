use std::time::Duration;

use crate::constants::{
    DEFAULT_COLLABORATOR_TIMEOUT_MS, DEFAULT_DENSE_WEIGHT, DEFAULT_DIVERSITY_PENALTY,
};

/// Weighting used by [`super::ScoreFusion`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionConfig {
    /// Weight of the dense side (`α`); the sparse side gets `1 - α`.
    pub dense_weight: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            dense_weight: DEFAULT_DENSE_WEIGHT,
        }
    }
}

impl FusionConfig {
    pub fn with_dense_weight(mut self, dense_weight: f32) -> Self {
        self.dense_weight = dense_weight;
        self
    }

    pub fn sparse_weight(&self) -> f32 {
        1.0 - self.dense_weight
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.dense_weight) {
            return Err(format!(
                "dense_weight must be between 0.0 and 1.0, got {}",
                self.dense_weight
            ));
        }
        Ok(())
    }
}

/// Settings for [`super::HybridRetriever`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalConfig {
    pub fusion: FusionConfig,
    /// Subtracted once per repeat occurrence of a page.
    pub diversity_penalty: f32,
    /// Upper bound for each backend call.
    pub timeout: Duration,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            fusion: FusionConfig::default(),
            diversity_penalty: DEFAULT_DIVERSITY_PENALTY,
            timeout: Duration::from_millis(DEFAULT_COLLABORATOR_TIMEOUT_MS),
        }
    }
}

impl RetrievalConfig {
    pub fn with_fusion(mut self, fusion: FusionConfig) -> Self {
        self.fusion = fusion;
        self
    }

    pub fn with_diversity_penalty(mut self, penalty: f32) -> Self {
        self.diversity_penalty = penalty;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.fusion.validate()?;
        if !self.diversity_penalty.is_finite() || self.diversity_penalty < 0.0 {
            return Err(format!(
                "diversity_penalty must be a non-negative number, got {}",
                self.diversity_penalty
            ));
        }
        if self.timeout.is_zero() {
            return Err("timeout must be > 0".to_string());
        }
        Ok(())
    }
}
