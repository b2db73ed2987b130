use crate::document::DocumentError;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("no documents to index")]
    EmptyStore,

    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    #[error("embedding failed: {0}")]
    Embedding(#[from] knowbase_llm::LlmError),

    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("embedding service returned an empty vector")]
    EmptyVector,
}
