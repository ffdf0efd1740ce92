//! Fixed-shape records shared by every ranking stage.
//!
//! [`Chunk`] → [`RetrievalHit`] (per retriever) → [`FusedCandidate`] (after score fusion)
//! → [`RankedCandidate`] (after diversity penalty and reranking).


use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::hashing::content_key;

/// Kind of content a chunk was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    #[default]
    Text,
    Table,
    ImageReference,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Table => "table",
            ContentType::ImageReference => "image_reference",
        }
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "table" => Ok(Self::Table),
            "image" | "image_reference" | "image-reference" => Ok(Self::ImageReference),
            other => Err(format!("Unknown content type: {}", other)),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata attached to a chunk by the ingestion collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Owning document.
    pub document_id: String,
    /// Source page, if known.
    pub page: Option<u32>,
    /// What the chunk was extracted from.
    pub content_type: ContentType,
}

impl ChunkMetadata {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            page: None,
            content_type: ContentType::Text,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }
}

/// An atomic retrievable unit. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    id: String,
    text: String,
    metadata: ChunkMetadata,
}

impl Chunk {
    /// Creates a chunk. If `metadata.page` is unset, the page is recovered from the
    /// `<doc>_page<N>_<rest>` id convention when present.
    pub fn new(id: impl Into<String>, text: impl Into<String>, mut metadata: ChunkMetadata) -> Self {
        let id = id.into();
        if metadata.page.is_none() {
            metadata.page = Self::page_from_id(&id);
        }
        Self {
            id,
            text: text.into(),
            metadata,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn metadata(&self) -> &ChunkMetadata {
        &self.metadata
    }

    pub fn document_id(&self) -> &str {
        &self.metadata.document_id
    }

    pub fn page(&self) -> Option<u32> {
        self.metadata.page
    }

    pub fn content_type(&self) -> ContentType {
        self.metadata.content_type
    }

    /// Returns `Some(id)` unless the identifier is blank.
    pub fn explicit_id(&self) -> Option<&str> {
        let id = self.id.trim();
        (!id.is_empty()).then_some(self.id.as_str())
    }

    pub fn dedupe_key(&self) -> DedupeKey {
        DedupeKey::for_chunk(self)
    }

    /// Parses `N` out of an id shaped like `report_page12_chunk3`.
    pub fn page_from_id(id: &str) -> Option<u32> {
        let mut rest = id;
        while let Some(pos) = rest.find("_page") {
            let after = &rest[pos + "_page".len()..];
            let digits_len = after.bytes().take_while(u8::is_ascii_digit).count();
            if digits_len > 0 && after[digits_len..].starts_with('_') {
                return after[..digits_len].parse().ok();
            }
            rest = after;
        }
        None
    }
}

/// Stable identity used to merge hits for the same chunk.
///
/// The explicit chunk id when present, else the BLAKE3 hex digest of the chunk text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DedupeKey(String);

impl DedupeKey {
    pub fn for_chunk(chunk: &Chunk) -> Self {
        match chunk.explicit_id() {
            Some(id) => Self(id.to_string()),
            None => Self(content_key(chunk.text())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which retriever produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMethod {
    Dense,
    Sparse,
}

impl RetrievalMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalMethod::Dense => "dense",
            RetrievalMethod::Sparse => "sparse",
        }
    }
}

impl fmt::Display for RetrievalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chunk with the raw, retriever-specific relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub chunk: Chunk,
    /// Raw score; higher is better, range depends on the retriever.
    pub score: f32,
    pub method: RetrievalMethod,
}

impl RetrievalHit {
    pub fn dense(chunk: Chunk, score: f32) -> Self {
        Self {
            chunk,
            score,
            method: RetrievalMethod::Dense,
        }
    }

    pub fn sparse(chunk: Chunk, score: f32) -> Self {
        Self {
            chunk,
            score,
            method: RetrievalMethod::Sparse,
        }
    }
}

/// Result of merging every hit that resolved to the same [`DedupeKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedCandidate {
    pub chunk: Chunk,
    pub key: DedupeKey,
    /// Sum of weighted, jointly-normalized per-method scores.
    pub score: f32,
}

/// A fused candidate after diversity penalty and/or rerank scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub chunk: Chunk,
    /// Blended score, after any diversity penalty.
    pub blended_score: f32,
    /// Score assigned by the reranker, if a scoring tier ran.
    pub rerank_score: Option<f32>,
}

impl RankedCandidate {
    pub fn new(chunk: Chunk, blended_score: f32) -> Self {
        Self {
            chunk,
            blended_score,
            rerank_score: None,
        }
    }

    pub fn with_rerank_score(mut self, score: f32) -> Self {
        self.rerank_score = Some(score);
        self
    }

    /// Score used for final ordering: the rerank score when present.
    pub fn final_score(&self) -> f32 {
        self.rerank_score.unwrap_or(self.blended_score)
    }

    pub fn text(&self) -> &str {
        self.chunk.text()
    }

    pub fn page(&self) -> Option<u32> {
        self.chunk.page()
    }
}

impl From<FusedCandidate> for RankedCandidate {
    fn from(fused: FusedCandidate) -> Self {
        Self::new(fused.chunk, fused.score)
    }
}
