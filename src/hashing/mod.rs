//! BLAKE3 content hashing.
//!
//! Used for chunk dedupe keys (when a chunk has no explicit identifier) and for the
//! embedding cache in [`crate::embedding::http`].

use blake3::Hasher;

/// Full 32-byte BLAKE3 digest of `text`.
#[inline]
pub fn hash_text(text: &str) -> [u8; 32] {
    *blake3::hash(text.as_bytes()).as_bytes()
}

/// Lowercase hex BLAKE3 digest of a chunk's text.
///
/// Stable across calls and processes, so repeat queries fuse identical chunks under the
/// same key even when neither retriever reported an identifier.
#[inline]
pub fn content_key(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

/// Cache key for an embedding request. The model name is length-prefixed, so no split of
/// the same bytes between `model` and `text` (`("a|b", "c")` vs `("a", "b|c")`) collides.
#[inline]
pub fn hash_embedding_request(model: &str, text: &str) -> [u8; 32] {
    let mut hasher = Hasher::new();
    hasher.update(&(model.len() as u64).to_le_bytes());
    hasher.update(model.as_bytes());
    hasher.update(text.as_bytes());
    *hasher.finalize().as_bytes()
}

/// Numeric vector-store point id for a chunk within a document.
#[inline]
pub fn point_id(document_id: &str, chunk_key: &str) -> u64 {
    let digest = hash_embedding_request(document_id, chunk_key);
    u64::from_le_bytes([
        digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
    ])
}
