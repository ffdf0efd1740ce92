//! Dense retrieval over a Qdrant collection.
//!
//! Points carry the chunk in their payload (`document_id`, `chunk_id`, `text`, `page`,
//! `content_type`); searches are filtered to a single `document_id`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, Distance, Filter, PointStruct, ScoredPoint,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use tracing::{debug, info};

use super::{RetrievalError, RetrievalResult, Retriever};
use crate::embedding::Embedder;
use crate::hashing::point_id;
use crate::types::{Chunk, ChunkMetadata, ContentType, RetrievalHit};

pub const DEFAULT_COLLECTION_NAME: &str = "ragline_chunks";

const BACKEND: &str = "qdrant";

pub struct QdrantRetriever {
    client: Qdrant,
    url: String,
    collection: String,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for QdrantRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantRetriever")
            .field("url", &self.url)
            .field("collection", &self.collection)
            .finish()
    }
}

impl QdrantRetriever {
    pub fn new(
        url: &str,
        collection: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> RetrievalResult<Self> {
        let client =
            Qdrant::from_url(url)
                .build()
                .map_err(|e| RetrievalError::ConnectionFailed {
                    backend: BACKEND,
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

        Ok(Self {
            client,
            url: url.to_string(),
            collection: collection.into(),
            embedder,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub async fn health_check(&self) -> RetrievalResult<()> {
        self.client
            .health_check()
            .await
            .map_err(|e| RetrievalError::ConnectionFailed {
                backend: BACKEND,
                url: self.url.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Creates the collection (cosine distance) if it does not exist yet.
    pub async fn ensure_collection(&self, vector_size: u64) -> RetrievalResult<()> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| self.search_error(e))?;

        if !exists {
            info!(collection = %self.collection, vector_size, "Creating Qdrant collection");
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection)
                        .vectors_config(VectorParamsBuilder::new(vector_size, Distance::Cosine))
                        .on_disk_payload(true),
                )
                .await
                .map_err(|e| self.search_error(e))?;
        }
        Ok(())
    }

    /// Embeds and upserts `chunks`. Point ids derive from the document id and dedupe key,
    /// so re-indexing a chunk overwrites it.
    pub async fn index_chunks(&self, chunks: &[Chunk]) -> RetrievalResult<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text().to_string()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;

        let points: Vec<PointStruct> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| {
                PointStruct::new(
                    point_id(chunk.document_id(), chunk.dedupe_key().as_str()),
                    vector,
                    chunk_payload(chunk),
                )
            })
            .collect();

        let count = points.len();
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(|e| self.search_error(e))?;

        debug!(collection = %self.collection, points = count, "Indexed chunks");
        Ok(())
    }

    fn search_error(&self, e: impl std::fmt::Display) -> RetrievalError {
        RetrievalError::SearchFailed {
            backend: BACKEND,
            message: format!("collection '{}': {}", self.collection, e),
        }
    }
}

#[async_trait]
impl Retriever for QdrantRetriever {
    async fn query(
        &self,
        document_id: &str,
        query: &str,
        top_k: usize,
    ) -> RetrievalResult<Vec<RetrievalHit>> {
        let vector = self.embedder.embed(query).await?;

        let request = SearchPointsBuilder::new(&self.collection, vector, top_k as u64)
            .with_payload(true)
            .filter(Filter::must([Condition::matches(
                "document_id",
                document_id.to_string(),
            )]));

        let response = self
            .client
            .search_points(request)
            .await
            .map_err(|e| self.search_error(e))?;

        let hits: Vec<RetrievalHit> = response
            .result
            .into_iter()
            .filter_map(|point| hit_from_scored_point(point, document_id))
            .collect();

        debug!(document_id, hits = hits.len(), "Qdrant search complete");
        Ok(hits)
    }
}

fn chunk_payload(chunk: &Chunk) -> HashMap<String, qdrant_client::qdrant::Value> {
    let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
    payload.insert("document_id".to_string(), chunk.document_id().into());
    payload.insert("chunk_id".to_string(), chunk.id().into());
    payload.insert("text".to_string(), chunk.text().into());
    payload.insert(
        "content_type".to_string(),
        chunk.content_type().as_str().into(),
    );
    if let Some(page) = chunk.page() {
        payload.insert("page".to_string(), i64::from(page).into());
    }
    payload
}

/// Rebuilds a hit from a scored point; points without text are skipped.
fn hit_from_scored_point(point: ScoredPoint, document_id: &str) -> Option<RetrievalHit> {
    let payload = point.payload;

    let text = payload.get("text").and_then(|v| v.as_str())?.to_string();

    let chunk_id = payload
        .get("chunk_id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .or_else(|| match point.id.and_then(|pid| pid.point_id_options) {
            Some(PointIdOptions::Num(n)) => Some(n.to_string()),
            Some(PointIdOptions::Uuid(u)) => Some(u),
            None => None,
        })
        .unwrap_or_default();

    let mut metadata = ChunkMetadata::new(
        payload
            .get("document_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| document_id.to_string()),
    );

    if let Some(page) = payload
        .get("page")
        .and_then(|v| v.as_integer())
        .and_then(|p| u32::try_from(p).ok())
    {
        metadata = metadata.with_page(page);
    }

    if let Some(content_type) = payload
        .get("content_type")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<ContentType>().ok())
    {
        metadata = metadata.with_content_type(content_type);
    }

    Some(RetrievalHit::dense(
        Chunk::new(chunk_id, text, metadata),
        point.score,
    ))
}
