//! Hybrid retrieval over a real in-memory lexical index.

mod common;

use std::sync::Arc;

use ragline::{
    DedupeKey, HybridRetriever, LexicalIndex, MockGenerator, MockRetriever, PipelineRequest,
    RetrievalConfig, RetrievalHit, RetrievalMethod, Retriever,
};

use common::fixtures::{DOC_ID, PipelineFixture, chunk, paged_chunk};

fn corpus() -> Vec<ragline::Chunk> {
    vec![
        paged_chunk("r_page1_0", "Revenue grew twelve percent in 2021", 1),
        paged_chunk("r_page1_1", "Revenue outlook for 2022 remains cautious", 1),
        paged_chunk("r_page2_0", "Operating costs were flat year over year", 2),
        paged_chunk("r_page3_0", "Headcount doubled after the merger", 3),
    ]
}

fn lexical() -> Arc<LexicalIndex> {
    let index = LexicalIndex::in_memory().unwrap();
    index.add_chunks(&corpus()).unwrap();
    Arc::new(index)
}

#[tokio::test]
async fn test_lexical_index_scopes_to_document() {
    let index = lexical();
    index
        .add_chunks(&[ragline::Chunk::new(
            "other_0",
            "Revenue grew everywhere",
            ragline::ChunkMetadata::new("other_doc"),
        )])
        .unwrap();

    let hits = index.query(DOC_ID, "revenue", 10).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.chunk.document_id() == DOC_ID));
    assert!(hits.iter().all(|h| h.method == RetrievalMethod::Sparse));
}

#[tokio::test]
async fn test_hybrid_merges_dense_and_sparse_copies() {
    let dense = MockRetriever::new(vec![
        RetrievalHit::dense(corpus()[0].clone(), 0.92),
        RetrievalHit::dense(corpus()[2].clone(), 0.31),
    ]);
    let hybrid = HybridRetriever::new(Arc::new(dense), lexical(), RetrievalConfig::default());

    let ranked = hybrid.retrieve(DOC_ID, "revenue 2021", 10).await;

    let keys: Vec<DedupeKey> = ranked.iter().map(|c| c.chunk.dedupe_key()).collect();
    let mut unique = keys.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(keys.len(), unique.len());

    assert_eq!(ranked[0].chunk.id(), "r_page1_0");
    assert!(ranked.iter().all(|c| (-1.0..=1.0).contains(&c.blended_score)));
}

#[tokio::test]
async fn test_hybrid_penalizes_repeated_pages() {
    let dense = MockRetriever::new(vec![
        RetrievalHit::dense(corpus()[0].clone(), 1.0),
        RetrievalHit::dense(corpus()[1].clone(), 0.95),
        RetrievalHit::dense(corpus()[2].clone(), 0.90),
    ]);
    let hybrid = HybridRetriever::new(
        Arc::new(dense),
        Arc::new(MockRetriever::empty()),
        RetrievalConfig::default().with_diversity_penalty(0.5),
    );

    let ranked = hybrid.retrieve(DOC_ID, "anything", 10).await;
    let order: Vec<&str> = ranked.iter().map(|c| c.chunk.id()).collect();
    assert_eq!(order, vec!["r_page1_0", "r_page2_0", "r_page1_1"]);
}

#[tokio::test]
async fn test_removed_document_is_not_retrieved() {
    let index = lexical();
    assert_eq!(index.len(), 4);

    index.remove_document(DOC_ID).unwrap();
    assert!(index.is_empty());
    assert!(index.query(DOC_ID, "revenue", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_pipeline_over_lexical_backend() {
    let pipeline = PipelineFixture::new()
        .dense_hits(vec![(chunk("unrelated", "Board of directors"), 0.2)])
        .sparse(lexical())
        .generator(Arc::new(MockGenerator::new("Headcount doubled.")))
        .build();

    let result = pipeline
        .run(PipelineRequest::new(DOC_ID, "headcount merger").with_top_k(1))
        .await
        .unwrap();

    assert_eq!(result.candidates[0].chunk.id(), "r_page3_0");
    assert_eq!(result.citations[0].page, Some(3));
}
