//! Sparse retrieval: an in-memory tantivy BM25 index over chunk text.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, ConstScoreQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, STORED, STRING, Schema, SchemaBuilder, TEXT, TantivyDocument, Value,
};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Term, doc};
use tracing::{debug, warn};

use super::{RetrievalError, RetrievalResult, Retriever};
use crate::types::{Chunk, ChunkMetadata, ContentType, RetrievalHit};

const WRITER_HEAP_BYTES: usize = 15_000_000;

#[derive(Debug, Clone)]
struct LexicalSchema {
    schema: Schema,
    chunk_id: Field,
    document_id: Field,
    text: Field,
    page: Field,
    content_type: Field,
}

impl LexicalSchema {
    fn build() -> Self {
        let mut builder = SchemaBuilder::default();
        let chunk_id = builder.add_text_field("chunk_id", STRING | STORED);
        let document_id = builder.add_text_field("document_id", STRING | STORED);
        let text = builder.add_text_field("text", TEXT | STORED);
        let page = builder.add_u64_field("page", STORED);
        let content_type = builder.add_text_field("content_type", STRING | STORED);

        Self {
            schema: builder.build(),
            chunk_id,
            document_id,
            text,
            page,
            content_type,
        }
    }
}

struct IndexState {
    schema: LexicalSchema,
    index: Index,
    writer: Mutex<IndexWriter>,
    reader: IndexReader,
}

/// BM25 index. Writes go through one mutex-guarded writer; searches read a
/// reloaded snapshot on the blocking pool and never take the writer lock.
pub struct LexicalIndex {
    state: Arc<IndexState>,
}

impl std::fmt::Debug for LexicalIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LexicalIndex")
            .field("docs", &self.len())
            .finish()
    }
}

impl LexicalIndex {
    pub fn in_memory() -> RetrievalResult<Self> {
        let schema = LexicalSchema::build();
        let index = Index::create_in_ram(schema.schema.clone());
        let writer = index.writer_with_num_threads(1, WRITER_HEAP_BYTES)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        Ok(Self {
            state: Arc::new(IndexState {
                schema,
                index,
                writer: Mutex::new(writer),
                reader,
            }),
        })
    }

    /// Indexes `chunks` and makes them searchable before returning.
    pub fn add_chunks(&self, chunks: &[Chunk]) -> RetrievalResult<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let state = &self.state;

        {
            let mut writer = state.writer.lock();
            for chunk in chunks {
                let mut document = doc!(
                    state.schema.chunk_id => chunk.id(),
                    state.schema.document_id => chunk.document_id(),
                    state.schema.text => chunk.text(),
                    state.schema.content_type => chunk.content_type().as_str(),
                );
                if let Some(page) = chunk.page() {
                    document.add_u64(state.schema.page, u64::from(page));
                }
                writer.add_document(document)?;
            }
            writer.commit()?;
        }

        state.reader.reload()?;
        debug!(chunks = chunks.len(), "Added chunks to lexical index");
        Ok(())
    }

    /// Removes every chunk of `document_id`.
    pub fn remove_document(&self, document_id: &str) -> RetrievalResult<()> {
        let state = &self.state;
        {
            let mut writer = state.writer.lock();
            writer.delete_term(Term::from_field_text(state.schema.document_id, document_id));
            writer.commit()?;
        }
        state.reader.reload()?;
        Ok(())
    }

    /// Number of indexed chunks across all documents.
    pub fn len(&self) -> u64 {
        self.state.reader.searcher().num_docs()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IndexState {
    fn build_query(&self, document_id: &str, query: &str) -> Box<dyn Query> {
        let parser = QueryParser::for_index(&self.index, vec![self.schema.text]);
        let (text_query, errors) = parser.parse_query_lenient(query);
        if !errors.is_empty() {
            debug!(errors = errors.len(), "Lenient query parse skipped invalid syntax");
        }

        let document_filter = TermQuery::new(
            Term::from_field_text(self.schema.document_id, document_id),
            IndexRecordOption::Basic,
        );

        Box::new(BooleanQuery::new(vec![
            (Occur::Must, text_query),
            (
                Occur::Must,
                Box::new(ConstScoreQuery::new(Box::new(document_filter), 0.0)),
            ),
        ]))
    }

    fn to_hit(&self, score: f32, document: &TantivyDocument) -> Option<RetrievalHit> {
        let text_of = |field: Field| {
            document
                .get_first(field)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        let text = text_of(self.schema.text)?;
        let chunk_id = text_of(self.schema.chunk_id).unwrap_or_default();
        let document_id = text_of(self.schema.document_id).unwrap_or_default();

        let mut metadata = ChunkMetadata::new(document_id);
        if let Some(page) = document
            .get_first(self.schema.page)
            .and_then(|v| v.as_u64())
            .and_then(|p| u32::try_from(p).ok())
        {
            metadata = metadata.with_page(page);
        }
        if let Some(content_type) = text_of(self.schema.content_type)
            .and_then(|s| s.parse::<ContentType>().ok())
        {
            metadata = metadata.with_content_type(content_type);
        }

        Some(RetrievalHit::sparse(
            Chunk::new(chunk_id, text, metadata),
            score,
        ))
    }

    fn search(
        &self,
        document_id: &str,
        query: &str,
        top_k: usize,
    ) -> RetrievalResult<Vec<RetrievalHit>> {
        if top_k == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let top_docs = searcher.search(
            &self.build_query(document_id, query),
            &TopDocs::with_limit(top_k),
        )?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let document: TantivyDocument = searcher.doc(address)?;
            match self.to_hit(score, &document) {
                Some(hit) => hits.push(hit),
                None => warn!(?address, "Indexed chunk has no stored text"),
            }
        }
        Ok(hits)
    }
}

#[async_trait]
impl Retriever for LexicalIndex {
    async fn query(
        &self,
        document_id: &str,
        query: &str,
        top_k: usize,
    ) -> RetrievalResult<Vec<RetrievalHit>> {
        let state = Arc::clone(&self.state);
        let (document, text) = (document_id.to_string(), query.to_string());
        let hits = tokio::task::spawn_blocking(move || state.search(&document, &text, top_k))
            .await
            .map_err(|e| RetrievalError::SearchFailed {
                backend: "tantivy",
                message: format!("search task failed: {}", e),
            })?
            .map_err(|e| RetrievalError::SearchFailed {
                backend: "tantivy",
                message: e.to_string(),
            })?;
        debug!(document_id, hits = hits.len(), "Lexical search complete");
        Ok(hits)
    }
}
