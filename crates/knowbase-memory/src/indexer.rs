use knowbase_llm::provider::{EmbedInput, EmbeddingProvider, StatusTx};

use crate::document::{Chunk, LoaderRegistry, SplitterConfig, TextSplitter};
use crate::error::IndexError;
use crate::store::DocumentStore;
use crate::vector_index::VectorIndex;

/// Cohere accepts at most 96 texts per embed call.
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 96;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerConfig {
    pub splitter: SplitterConfig,
    pub embed_batch_size: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            splitter: SplitterConfig::default(),
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
        }
    }
}

/// Turns the full contents of a [`DocumentStore`] into a fresh [`VectorIndex`].
pub struct IndexBuilder<E> {
    embedder: E,
    loaders: LoaderRegistry,
    splitter: TextSplitter,
    embed_batch_size: usize,
    status_tx: Option<StatusTx>,
}

impl<E: EmbeddingProvider> IndexBuilder<E> {
    #[must_use]
    pub fn new(embedder: E, config: IndexerConfig) -> Self {
        Self {
            embedder,
            loaders: LoaderRegistry::default(),
            splitter: TextSplitter::new(config.splitter),
            embed_batch_size: config.embed_batch_size.max(1),
            status_tx: None,
        }
    }

    #[must_use]
    pub fn with_status_tx(mut self, tx: StatusTx) -> Self {
        self.status_tx = Some(tx);
        self
    }

    #[must_use]
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    fn status(&self, msg: impl Into<String>) {
        if let Some(ref tx) = self.status_tx {
            let _ = tx.send(msg.into());
        }
    }

    /// Load, split and embed every stored document.
    ///
    /// Any failure aborts the build; no partial index is returned.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::EmptyStore`] when there is nothing to index, and
    /// propagates loader and embedding errors unchanged.
    pub async fn build(&self, store: &DocumentStore) -> Result<VectorIndex, IndexError> {
        let paths = store.paths().await?;
        if paths.is_empty() {
            return Err(IndexError::EmptyStore);
        }

        self.status("Loading documents");
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut document_count = 0usize;
        for path in &paths {
            let documents = self
                .loaders
                .for_path(path)
                .load(path)
                .await
                .inspect_err(|e| {
                    tracing::error!(path = %path.display(), error = %e, "failed to load document");
                })?;
            for document in &documents {
                let split = self.splitter.split(document);
                tracing::debug!(
                    file = %document.metadata.file_name,
                    chunks = split.len(),
                    "split document"
                );
                chunks.extend(split);
            }
            document_count += 1;
        }

        let total = chunks.len();
        tracing::info!(
            documents = document_count,
            chunks = total,
            embedder = self.embedder.name(),
            "embedding chunks"
        );

        let mut index = VectorIndex::new();
        let mut done = 0usize;
        let mut pending = chunks.into_iter().peekable();
        while pending.peek().is_some() {
            let batch: Vec<Chunk> = pending.by_ref().take(self.embed_batch_size).collect();
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();

            let vectors = self
                .embedder
                .embed_batch(&texts, EmbedInput::SearchDocument)
                .await
                .inspect_err(|e| tracing::error!(error = %e, "embedding failed during indexing"))?;

            if vectors.len() != batch.len() {
                return Err(IndexError::Embedding(
                    knowbase_llm::LlmError::EmbeddingCount {
                        provider: self.embedder.name().to_owned(),
                        expected: batch.len(),
                        got: vectors.len(),
                    },
                ));
            }

            for (chunk, vector) in batch.into_iter().zip(vectors) {
                index.insert(chunk, vector)?;
            }
            done += texts.len();
            self.status(format!("Embedding chunks {done}/{total}"));
        }

        tracing::info!(
            index = %index.id(),
            chunks = index.len(),
            documents = document_count,
            "index built"
        );
        self.status(format!(
            "Index ready: {} chunks from {document_count} documents",
            index.len()
        ));
        Ok(index)
    }
}
