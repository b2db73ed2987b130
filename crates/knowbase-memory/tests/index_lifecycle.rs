use knowbase_llm::EmbeddingProvider;
use knowbase_llm::mock::MockEmbedder;
use knowbase_llm::provider::EmbedInput;
use knowbase_memory::{DocumentStore, IndexBuilder, IndexerConfig};

async fn seeded_store(dir: &std::path::Path) -> DocumentStore {
    let store = DocumentStore::new(dir.join("doc"));
    store
        .add(
            "geography.txt",
            b"The capital of France is Paris. Berlin is the capital of Germany.",
        )
        .await
        .unwrap();
    store
        .add(
            "cooking.md",
            b"Bread needs flour, water, salt and yeast. Knead the dough for ten minutes.",
        )
        .await
        .unwrap();
    store
}

fn retrieved(index: &knowbase_memory::VectorIndex, query: &[f32]) -> Vec<(String, usize)> {
    index
        .search(query, 5)
        .into_iter()
        .map(|s| (s.chunk.metadata.file_name, s.chunk.chunk_index))
        .collect()
}

#[tokio::test]
async fn rebuild_from_same_documents_retrieves_same_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(dir.path()).await;
    let embedder = MockEmbedder::default();
    let builder = IndexBuilder::new(embedder.clone(), IndexerConfig::default());

    let first = builder.build(&store).await.unwrap();
    let query = embedder
        .embed("What is the capital of France?", EmbedInput::SearchQuery)
        .await
        .unwrap();
    let before = retrieved(&first, &query);
    drop(first);

    let second = builder.build(&store).await.unwrap();
    assert_eq!(retrieved(&second, &query), before);
}

#[tokio::test]
async fn rebuild_after_upload_has_new_identity_and_content() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(dir.path()).await;
    let builder = IndexBuilder::new(MockEmbedder::default(), IndexerConfig::default());

    let first = builder.build(&store).await.unwrap();
    assert!(
        store
            .add("rust.txt", b"Ferris is the Rust mascot.")
            .await
            .unwrap()
    );
    let second = builder.build(&store).await.unwrap();

    assert_ne!(first.id(), second.id());
    assert_eq!(second.document_count(), first.document_count() + 1);
    assert!(second.chunks().any(|c| c.content.contains("Ferris")));
}

#[tokio::test]
async fn most_relevant_chunk_ranks_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(dir.path()).await;
    let embedder = MockEmbedder::default();
    let index = IndexBuilder::new(embedder.clone(), IndexerConfig::default())
        .build(&store)
        .await
        .unwrap();

    let query = embedder
        .embed("flour water yeast dough", EmbedInput::SearchQuery)
        .await
        .unwrap();
    let top = index.search(&query, 1);
    assert_eq!(top[0].chunk.metadata.file_name, "cooking.md");
}

#[tokio::test]
async fn duplicate_upload_leaves_content_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(dir.path()).await;
    assert!(!store.add("geography.txt", b"overwritten").await.unwrap());
    let content = std::fs::read_to_string(dir.path().join("doc").join("geography.txt")).unwrap();
    assert!(content.starts_with("The capital of France"));
}
