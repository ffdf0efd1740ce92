use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::config::PipelineConfig;
use super::error::PipelineError;
use super::postprocess::PostProcessor;
use super::refine::QueryRefiner;
use super::request::PipelineRequest;
use super::result::{AttemptRecord, Citation, DebugInfo, PipelineResult};
use crate::citation::SourceCiter;
use crate::constants::retrieve_depth;
use crate::documents::DocumentMetadataStore;
use crate::generation::{Generator, PromptBuilder, generate_within};
use crate::judge::{AnswerJudge, Judge, JudgeConfig, JudgeVerdict};
use crate::rerank::{RerankTierKind, Reranker};
use crate::retrieval::HybridRetriever;

/// Pipeline states, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Refine,
    Retrieve,
    Rerank,
    Generate,
    Judge,
    Retry,
    PostProcess,
    Cite,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Refine => "refine",
            Stage::Retrieve => "retrieve",
            Stage::Rerank => "rerank",
            Stage::Generate => "generate",
            Stage::Judge => "judge",
            Stage::Retry => "retry",
            Stage::PostProcess => "postprocess",
            Stage::Cite => "cite",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orchestrates one question from refinement to cited answer.
///
/// All collaborators are shared, immutable handles; one `Pipeline` serves any number of
/// concurrent `run` calls.
pub struct Pipeline {
    documents: Arc<dyn DocumentMetadataStore>,
    refiner: Option<Arc<dyn QueryRefiner>>,
    retriever: HybridRetriever,
    reranker: Reranker,
    generator: Arc<dyn Generator>,
    judge: Arc<dyn Judge>,
    citer: SourceCiter,
    config: PipelineConfig,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("refines", &self.refiner.is_some())
            .field("retriever", &self.retriever)
            .field("reranker", &self.reranker)
            .field("citer", &self.citer)
            .field("config", &self.config)
            .finish()
    }
}

impl Pipeline {
    pub fn builder(
        documents: Arc<dyn DocumentMetadataStore>,
        retriever: HybridRetriever,
        generator: Arc<dyn Generator>,
    ) -> PipelineBuilder {
        PipelineBuilder::new(documents, retriever, generator)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn reranker(&self) -> &Reranker {
        &self.reranker
    }

    pub async fn run(&self, request: PipelineRequest) -> Result<PipelineResult, PipelineError> {
        let threshold = request.threshold();
        let PipelineRequest {
            document_id,
            query,
            top_k,
            rerank_enabled,
            max_attempts,
            debug,
            ..
        } = request;

        if !self.documents.contains(&document_id) {
            warn!(document_id = %document_id, "Document not found");
            return Err(PipelineError::DocumentNotFound { document_id });
        }

        debug!(stage = %Stage::Refine, query_len = query.len());
        let refined_query = self.refine(&query).await;

        debug!(stage = %Stage::Retrieve, top_k);
        let retrieved = self
            .retriever
            .retrieve(&document_id, &refined_query, retrieve_depth(top_k))
            .await;
        let debug_retrieved = debug.then(|| retrieved.clone());

        let (candidates, rerank_tier) = if rerank_enabled {
            debug!(stage = %Stage::Rerank, pool = retrieved.len());
            let outcome = self.reranker.rerank(&refined_query, retrieved, top_k).await;
            (outcome.candidates, outcome.tier)
        } else {
            let mut kept = retrieved;
            kept.truncate(top_k);
            (kept, RerankTierKind::Skipped)
        };

        debug!(stage = %Stage::Generate, context = candidates.len());
        let prompt = PromptBuilder::new(self.config.max_context_tokens)
            .with_snippet_chars(self.config.snippet_chars)
            .build(&query, &candidates);

        let first_answer = generate_within(
            self.generator.as_ref(),
            &prompt.text,
            self.config.generation,
            self.config.timeout,
        )
        .await
        .map_err(|e| {
            warn!(document_id = %document_id, error = %e, "Answer generation failed");
            PipelineError::GenerationFailed {
                document_id: document_id.clone(),
                details: e.to_string(),
            }
        })?;

        debug!(stage = %Stage::Judge);
        let first_verdict = self.judge.judge(&query, &first_answer, &candidates).await;

        let mut records = vec![AttemptRecord {
            answer: first_answer,
            verdict: first_verdict.clone(),
        }];
        let mut verdict = first_verdict;
        let mut attempts = 0u32;
        let retry_prompt = prompt.retry();

        while !verdict.passes(threshold) && attempts < max_attempts {
            attempts += 1;
            info!(
                attempt = attempts,
                score = verdict.score,
                threshold,
                "Low judge score, regenerating"
            );
            debug!(stage = %Stage::Retry, attempt = attempts);

            let answer = match generate_within(
                self.generator.as_ref(),
                &retry_prompt,
                self.config.generation,
                self.config.timeout,
            )
            .await
            {
                Ok(answer) => answer,
                Err(e) => {
                    warn!(attempt = attempts, error = %e, "Retry generation failed, keeping previous answer");
                    break;
                }
            };

            debug!(stage = %Stage::Judge, attempt = attempts);
            verdict = self.judge.judge(&query, &answer, &candidates).await;
            records.push(AttemptRecord {
                answer,
                verdict: verdict.clone(),
            });
        }

        debug!(stage = %Stage::PostProcess);
        // A failed retry is never recorded, so the last record is the answer to keep.
        let chosen = records
            .last()
            .map(|r| r.answer.as_str())
            .unwrap_or_default();
        let processed = PostProcessor::new(self.config.max_answer_chars).process(chosen);

        debug!(stage = %Stage::Cite);
        let cited = self.citer.cite(&query, &processed, &candidates).await;
        let mut final_answer = cited.text;
        if self.config.append_confidence {
            final_answer.push_str(&confidence_footer(&verdict));
        }

        info!(
            document_id = %document_id,
            rerank_tier = %rerank_tier,
            score = verdict.score,
            retries = attempts,
            context = candidates.len(),
            "Pipeline complete"
        );
        debug!(stage = %Stage::Done);

        Ok(PipelineResult {
            citations: Citation::for_context(&candidates),
            debug: debug_retrieved.map(|retrieved| DebugInfo {
                retrieved,
                prompt: prompt.text,
            }),
            document_id,
            query,
            refined_query,
            candidates,
            attempt_records: records,
            attempts,
            final_answer,
            citation_method: cited.method,
            rerank_tier,
        })
    }

    /// Refined query, or `query` itself when there is no refiner or it fails.
    async fn refine(&self, query: &str) -> String {
        let Some(refiner) = &self.refiner else {
            return query.to_string();
        };

        match tokio::time::timeout(self.config.timeout, refiner.refine(query)).await {
            Ok(Ok(refined)) if !refined.trim().is_empty() => refined.trim().to_string(),
            Ok(Ok(_)) => {
                warn!("Refiner returned an empty query, using original");
                query.to_string()
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Query refinement failed, using original");
                query.to_string()
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.config.timeout.as_millis() as u64,
                    "Query refinement timed out, using original"
                );
                query.to_string()
            }
        }
    }
}

/// `\n\n---\nAnswer Confidence: <pct>/100\nReason: <reason>`
pub fn confidence_footer(verdict: &JudgeVerdict) -> String {
    format!(
        "\n\n---\nAnswer Confidence: {}/100\nReason: {}",
        verdict.percent(),
        verdict.reason
    )
}

/// Wires collaborators into a [`Pipeline`].
///
/// Only the document store, the hybrid retriever and the generator are required. Without
/// overrides the pipeline skips refinement, passes candidates through unranked, judges
/// with the overlap heuristic and cites through the generator.
pub struct PipelineBuilder {
    documents: Arc<dyn DocumentMetadataStore>,
    retriever: HybridRetriever,
    generator: Arc<dyn Generator>,
    refiner: Option<Arc<dyn QueryRefiner>>,
    reranker: Option<Reranker>,
    judge: Option<Arc<dyn Judge>>,
    citer: Option<SourceCiter>,
    config: PipelineConfig,
}

impl PipelineBuilder {
    pub fn new(
        documents: Arc<dyn DocumentMetadataStore>,
        retriever: HybridRetriever,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            documents,
            retriever,
            generator,
            refiner: None,
            reranker: None,
            judge: None,
            citer: None,
            config: PipelineConfig::default(),
        }
    }

    pub fn refiner(mut self, refiner: Arc<dyn QueryRefiner>) -> Self {
        self.refiner = Some(refiner);
        self
    }

    pub fn reranker(mut self, reranker: Reranker) -> Self {
        self.reranker = Some(reranker);
        self
    }

    pub fn judge(mut self, judge: Arc<dyn Judge>) -> Self {
        self.judge = Some(judge);
        self
    }

    pub fn citer(mut self, citer: SourceCiter) -> Self {
        self.citer = Some(citer);
        self
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Pipeline {
        let timeout = self.config.timeout;
        let judge = self.judge.unwrap_or_else(|| {
            Arc::new(AnswerJudge::heuristic(
                JudgeConfig::default().with_timeout(timeout),
            ))
        });
        let citer = self
            .citer
            .unwrap_or_else(|| SourceCiter::new(self.generator.clone()).with_timeout(timeout));

        Pipeline {
            documents: self.documents,
            refiner: self.refiner,
            retriever: self.retriever,
            reranker: self.reranker.unwrap_or_else(Reranker::passthrough),
            generator: self.generator,
            judge,
            citer,
            config: self.config,
        }
    }
}
