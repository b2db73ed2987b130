//! Document ingestion and in-memory semantic retrieval.
//!
//! Files land in a [`DocumentStore`], an [`IndexBuilder`] turns the whole
//! store into a [`VectorIndex`], and the index answers top-K similarity
//! queries until the document set changes.

pub mod document;
pub mod error;
pub mod indexer;
pub mod store;
pub mod vector_index;

pub use document::{Chunk, Document, DocumentError, DocumentMetadata};
pub use error::IndexError;
pub use indexer::{IndexBuilder, IndexerConfig};
pub use store::DocumentStore;
pub use vector_index::{IndexId, ScoredChunk, VectorIndex};
