//! Lightweight per-document metadata.
//!
//! Chunk text and vectors live in the retrieval backends; this store only answers
//! "is this document known?" for the pipeline and lists what was ingested.


use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::Chunk;

pub const UNKNOWN_FILE_NAME: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub document_id: String,
    pub file_name: String,
    pub page_count: u32,
    pub chunk_count: usize,
}

impl DocumentMetadata {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            file_name: UNKNOWN_FILE_NAME.to_string(),
            page_count: 0,
            chunk_count: 0,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn with_page_count(mut self, page_count: u32) -> Self {
        self.page_count = page_count;
        self
    }

    pub fn with_chunk_count(mut self, chunk_count: usize) -> Self {
        self.chunk_count = chunk_count;
        self
    }

    /// Counts the chunks that belong to this document.
    pub fn with_chunks(mut self, chunks: &[Chunk]) -> Self {
        self.chunk_count = chunks
            .iter()
            .filter(|c| c.document_id() == self.document_id)
            .count();
        self
    }
}

/// Document metadata lookup used by the pipeline's existence check.
pub trait DocumentMetadataStore: Send + Sync {
    fn get(&self, document_id: &str) -> Option<DocumentMetadata>;

    fn contains(&self, document_id: &str) -> bool {
        self.get(document_id).is_some()
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<String, DocumentMetadata>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the metadata for `metadata.document_id`.
    pub fn save(&self, metadata: DocumentMetadata) {
        info!(
            document_id = %metadata.document_id,
            file_name = %metadata.file_name,
            pages = metadata.page_count,
            chunks = metadata.chunk_count,
            "Saved document metadata"
        );
        self.documents
            .write()
            .insert(metadata.document_id.clone(), metadata);
    }

    /// All documents, sorted by id.
    pub fn list(&self) -> Vec<DocumentMetadata> {
        let mut docs: Vec<_> = self.documents.read().values().cloned().collect();
        docs.sort_by(|a, b| a.document_id.cmp(&b.document_id));
        docs
    }

    /// Returns `true` if the document existed.
    pub fn delete(&self, document_id: &str) -> bool {
        self.documents.write().remove(document_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl DocumentMetadataStore for InMemoryDocumentStore {
    fn get(&self, document_id: &str) -> Option<DocumentMetadata> {
        self.documents.read().get(document_id).cloned()
    }
}
