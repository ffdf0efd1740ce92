//! OpenAI-compatible embedding client (`POST {base_url}/v1/embeddings`).
//!
//! Works against Ollama, vLLM, llama.cpp server and hosted OpenAI-style APIs. Results are
//! cached in memory keyed by a BLAKE3 hash of `(model, text)`, so the reranker's embedding
//! tier does not re-embed chunks it already saw.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::Embedder;
use super::error::EmbeddingError;
use crate::hashing::hash_embedding_request;

pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";
pub const DEFAULT_EMBEDDING_CACHE_CAPACITY: u64 = 10_000;
pub const DEFAULT_EMBEDDING_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct HttpEmbedderConfig {
    /// Base URL, e.g. `http://localhost:11434`.
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    /// Max cached embeddings. `0` disables the cache.
    pub cache_capacity: u64,
}

impl HttpEmbedderConfig {
    pub const ENV_URL: &'static str = "RAGLINE_EMBEDDING_URL";
    pub const ENV_MODEL: &'static str = "RAGLINE_EMBEDDING_MODEL";

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_EMBEDDING_TIMEOUT_SECS),
            cache_capacity: DEFAULT_EMBEDDING_CACHE_CAPACITY,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Returns `None` when `RAGLINE_EMBEDDING_URL` is unset or blank.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var(Self::ENV_URL)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())?;

        let model = std::env::var(Self::ENV_MODEL)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());

        Some(Self::new(base_url).with_model(model))
    }

    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(EmbeddingError::InvalidConfig {
                reason: format!("base_url must be an http(s) URL, got '{}'", self.base_url),
            });
        }
        if self.model.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "model cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Full endpoint URL.
    pub fn endpoint(&self) -> String {
        format!("{}/v1/embeddings", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

/// Embedding collaborator backed by an HTTP embedding service.
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: HttpEmbedderConfig,
    cache: Option<Cache<[u8; 32], Arc<Vec<f32>>>>,
}

impl std::fmt::Debug for HttpEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEmbedder")
            .field("config", &self.config)
            .field("cached", &self.cache.as_ref().map(|c| c.entry_count()))
            .finish()
    }
}

impl HttpEmbedder {
    pub fn new(config: HttpEmbedderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmbeddingError::InvalidConfig {
                reason: format!("Failed to build HTTP client: {}", e),
            })?;

        let cache = (config.cache_capacity > 0)
            .then(|| Cache::builder().max_capacity(config.cache_capacity).build());

        Ok(Self {
            client,
            config,
            cache,
        })
    }

    pub fn config(&self) -> &HttpEmbedderConfig {
        &self.config
    }

    fn cached(&self, text: &str) -> Option<Vec<f32>> {
        let cache = self.cache.as_ref()?;
        cache
            .get(&hash_embedding_request(&self.config.model, text))
            .map(|v| v.as_ref().clone())
    }

    fn remember(&self, text: &str, embedding: &[f32]) {
        if let Some(cache) = &self.cache {
            cache.insert(
                hash_embedding_request(&self.config.model, text),
                Arc::new(embedding.to_vec()),
            );
        }
    }

    async fn request(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = self.config.endpoint();
        debug!(url = %url, inputs = inputs.len(), model = %self.config.model, "Requesting embeddings");

        let resp = self
            .client
            .post(&url)
            .json(&EmbeddingRequest {
                model: &self.config.model,
                input: inputs,
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(EmbeddingError::RequestFailed {
                url,
                message: format!("status {}: {}", status, body),
            });
        }

        let parsed: EmbeddingResponse = resp.json().await?;
        order_embeddings(parsed, inputs.len())
    }
}

fn order_embeddings(
    response: EmbeddingResponse,
    expected: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if response.data.len() != expected {
        return Err(EmbeddingError::InvalidResponse {
            reason: format!(
                "expected {} embeddings, got {}",
                expected,
                response.data.len()
            ),
        });
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for (position, datum) in response.data.into_iter().enumerate() {
        let idx = datum.index.unwrap_or(position);
        match slots.get_mut(idx) {
            Some(slot @ None) => *slot = Some(datum.embedding),
            _ => {
                return Err(EmbeddingError::InvalidResponse {
                    reason: format!("duplicate or out-of-range embedding index {}", idx),
                });
            }
        }
    }

    slots
        .into_iter()
        .map(|slot| {
            slot.ok_or_else(|| EmbeddingError::InvalidResponse {
                reason: "missing embedding index".to_string(),
            })
        })
        .collect()
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut batch = self.embed_batch(&[text.to_string()]).await?;
        batch.pop().ok_or_else(|| EmbeddingError::InvalidResponse {
            reason: "empty embedding batch".to_string(),
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out: Vec<Option<Vec<f32>>> = texts.iter().map(|t| self.cached(t)).collect();

        let missing: Vec<usize> = out
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.is_none().then_some(i))
            .collect();

        if !missing.is_empty() {
            let inputs: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let fresh = self.request(&inputs).await.inspect_err(|e| {
                warn!(error = %e, inputs = inputs.len(), "Embedding request failed");
            })?;

            for (&i, embedding) in missing.iter().zip(fresh) {
                self.remember(&texts[i], &embedding);
                out[i] = Some(embedding);
            }
        }

        debug!(
            total = texts.len(),
            cache_hits = texts.len() - missing.len(),
            "Embedded batch"
        );

        Ok(out.into_iter().flatten().collect())
    }
}
