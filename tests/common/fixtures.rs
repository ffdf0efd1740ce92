//! Builders for pipeline integration tests.

use std::sync::Arc;

use ragline::{
    Chunk, ChunkMetadata, DocumentMetadata, Generator, HybridRetriever, InMemoryDocumentStore,
    Judge, MockGenerator, MockRetriever, Pipeline, PipelineConfig, Reranker, RetrievalConfig,
    RetrievalHit, Retriever, ScriptedJudge,
};

pub const DOC_ID: &str = "annual_report";

pub fn chunk(id: &str, text: &str) -> Chunk {
    Chunk::new(id, text, ChunkMetadata::new(DOC_ID))
}

pub fn paged_chunk(id: &str, text: &str, page: u32) -> Chunk {
    Chunk::new(id, text, ChunkMetadata::new(DOC_ID).with_page(page))
}

/// Fluent builder around [`Pipeline::builder`] with mock collaborators by default.
pub struct PipelineFixture {
    dense: Arc<dyn Retriever>,
    sparse: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    judge: Arc<dyn Judge>,
    reranker: Option<Reranker>,
    config: PipelineConfig,
    retrieval: RetrievalConfig,
    documents: Vec<&'static str>,
}

impl Default for PipelineFixture {
    fn default() -> Self {
        Self {
            dense: Arc::new(MockRetriever::empty()),
            sparse: Arc::new(MockRetriever::empty()),
            generator: Arc::new(MockGenerator::new("No answer.")),
            judge: Arc::new(ScriptedJudge::new([1.0])),
            reranker: None,
            config: PipelineConfig::default(),
            retrieval: RetrievalConfig::default(),
            documents: vec![DOC_ID],
        }
    }
}

impl PipelineFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dense_hits(mut self, hits: Vec<(Chunk, f32)>) -> Self {
        let hits = hits
            .into_iter()
            .map(|(c, s)| RetrievalHit::dense(c, s))
            .collect();
        self.dense = Arc::new(MockRetriever::new(hits));
        self
    }

    pub fn sparse_hits(mut self, hits: Vec<(Chunk, f32)>) -> Self {
        let hits = hits
            .into_iter()
            .map(|(c, s)| RetrievalHit::sparse(c, s))
            .collect();
        self.sparse = Arc::new(MockRetriever::new(hits));
        self
    }

    pub fn sparse(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.sparse = retriever;
        self
    }

    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn judge(mut self, judge: Arc<dyn Judge>) -> Self {
        self.judge = judge;
        self
    }

    pub fn reranker(mut self, reranker: Reranker) -> Self {
        self.reranker = Some(reranker);
        self
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn retrieval(mut self, retrieval: RetrievalConfig) -> Self {
        self.retrieval = retrieval;
        self
    }

    pub fn without_documents(mut self) -> Self {
        self.documents.clear();
        self
    }

    pub fn build(self) -> Pipeline {
        let store = InMemoryDocumentStore::new();
        for id in self.documents {
            store.save(DocumentMetadata::new(id).with_file_name(format!("{id}.pdf")));
        }

        let retriever = HybridRetriever::new(self.dense, self.sparse, self.retrieval);
        let mut builder = Pipeline::builder(Arc::new(store), retriever, self.generator)
            .judge(self.judge)
            .config(self.config);
        if let Some(reranker) = self.reranker {
            builder = builder.reranker(reranker);
        }
        builder.build()
    }
}
