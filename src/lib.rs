//! Ragline library crate: hybrid retrieval and confidence-gated answer synthesis over
//! ingested documents.
//!
//! # Public API Surface
//!
//! ## Pipeline
//! - [`Pipeline`], [`PipelineBuilder`], [`PipelineRequest`], [`PipelineResult`] - one
//!   question, end to end
//! - [`PipelineError`], [`ErrorResponse`] - the only caller-visible failures
//! - [`QueryDecomposer`], [`QueryExecutor`], [`SessionStore`] - multi-step questions
//!
//! ## Ranking
//! - [`HybridRetriever`], [`ScoreFusion`], [`DiversityPenalizer`] - first-pass ranking
//! - [`Reranker`], [`RerankTierKind`] - second pass with capability fallback
//!
//! ## Answer quality
//! - [`AnswerJudge`], [`JudgeVerdict`] - reliability scoring on `[0, 1]`
//! - [`SourceCiter`] - opt-in citation block
//!
//! ## Collaborators
//! - [`Retriever`], [`Embedder`], [`CrossEncoder`], [`Generator`], [`QueryRefiner`],
//!   [`DocumentMetadataStore`] - the seams backends plug into
//! - [`QdrantRetriever`], [`LexicalIndex`], [`HttpEmbedder`], [`BertCrossEncoder`],
//!   [`GenAiGenerator`] - concrete adapters
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod citation;
pub mod config;
pub mod constants;
pub mod decompose;
pub mod documents;
pub mod embedding;
pub mod generation;
pub mod hashing;
pub mod judge;
pub mod parsing;
pub mod pipeline;
pub mod rerank;
pub mod retrieval;
pub mod session;
pub mod text;
pub mod types;

pub use citation::{CitationMethod, CitedAnswer, SourceCiter};
pub use config::{Config, ConfigError};
pub use decompose::{
    QueryDecomposer, QueryExecutor, VisualizationKind, detect_visualization, needs_decomposition,
};
pub use documents::{DocumentMetadata, DocumentMetadataStore, InMemoryDocumentStore};
pub use embedding::{
    BertCrossEncoder, CrossEncoder, CrossEncoderConfig, CrossEncoderError, Embedder,
    EmbeddingError, HttpEmbedder, HttpEmbedderConfig,
};
#[cfg(any(test, feature = "mock"))]
pub use embedding::{MockCrossEncoder, MockEmbedder};
pub use generation::{
    GenAiConfig, GenAiGenerator, GenerationError, GenerationParams, Generator, PromptBuilder,
};
#[cfg(any(test, feature = "mock"))]
pub use generation::MockGenerator;
pub use hashing::content_key;
pub use judge::{
    AnswerJudge, Judge, JudgeConfig, JudgeMethod, JudgeVerdict, from_percent,
    normalize_threshold, to_percent,
};
#[cfg(any(test, feature = "mock"))]
pub use judge::ScriptedJudge;
pub use parsing::{last_structured, last_structured_as};
pub use pipeline::{
    AttemptRecord, Citation, ErrorResponse, GenerativeRefiner, Pipeline, PipelineBuilder,
    PipelineConfig, PipelineError, PipelineRequest, PipelineResult, QueryRefiner, Stage,
};
#[cfg(any(test, feature = "mock"))]
pub use pipeline::MockRefiner;
pub use rerank::{RerankConfig, RerankError, RerankOutcome, RerankTierKind, Reranker};
pub use retrieval::{
    DiversityPenalizer, FusionConfig, HybridRetriever, LexicalIndex, QdrantRetriever,
    RetrievalConfig, RetrievalError, Retriever, ScoreFusion,
};
#[cfg(any(test, feature = "mock"))]
pub use retrieval::MockRetriever;
pub use session::{SessionEntry, SessionStore};
pub use types::{
    Chunk, ChunkMetadata, ContentType, DedupeKey, FusedCandidate, RankedCandidate,
    RetrievalHit, RetrievalMethod,
};
