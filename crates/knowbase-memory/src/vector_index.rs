use std::collections::BTreeSet;
use std::fmt;

use uuid::Uuid;

use crate::document::Chunk;
use crate::error::IndexError;

/// Identity of one built index. Two builds never share an id, even from the
/// same documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexId(Uuid);

impl IndexId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

struct IndexedChunk {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// In-memory exact nearest-neighbour index over chunk embeddings.
pub struct VectorIndex {
    id: IndexId,
    dimensions: Option<usize>,
    entries: Vec<IndexedChunk>,
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorIndex")
            .field("id", &self.id)
            .field("dimensions", &self.dimensions)
            .field("chunks", &self.entries.len())
            .finish_non_exhaustive()
    }
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: IndexId::new(),
            dimensions: None,
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> IndexId {
        self.id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Number of distinct source documents with at least one chunk indexed.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.chunk.metadata.source.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// # Errors
    ///
    /// Returns an error if the vector is empty or its length differs from
    /// the vectors already indexed.
    pub fn insert(&mut self, chunk: Chunk, vector: Vec<f32>) -> Result<(), IndexError> {
        if vector.is_empty() {
            return Err(IndexError::EmptyVector);
        }
        match self.dimensions {
            Some(expected) if expected != vector.len() => {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    got: vector.len(),
                });
            }
            Some(_) => {}
            None => self.dimensions = Some(vector.len()),
        }
        self.entries.push(IndexedChunk { chunk, vector });
        Ok(())
    }

    /// Return the `limit` chunks most similar to `query`, best first.
    ///
    /// Ties keep insertion order, so results are stable for a fixed index.
    #[must_use]
    pub fn search(&self, query: &[f32], limit: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(query, &e.vector)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: self.entries[i].chunk.clone(),
                score,
            })
            .collect()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentMetadata;

    fn chunk(text: &str, source: &str, idx: usize) -> Chunk {
        Chunk {
            content: text.to_owned(),
            metadata: DocumentMetadata {
                source: source.to_owned(),
                file_name: source.to_owned(),
                content_type: "text/plain".to_owned(),
            },
            chunk_index: idx,
        }
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn search_ranks_by_similarity() {
        let mut index = VectorIndex::new();
        index.insert(chunk("east", "a", 0), vec![1.0, 0.0]).unwrap();
        index.insert(chunk("north", "a", 1), vec![0.0, 1.0]).unwrap();
        index
            .insert(chunk("north-east", "b", 0), vec![0.7, 0.7])
            .unwrap();

        let results = index.search(&[0.0, 1.0], 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.content, "north");
        assert_eq!(results[1].chunk.content, "north-east");
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn search_limit_larger_than_index() {
        let mut index = VectorIndex::new();
        index.insert(chunk("only", "a", 0), vec![1.0]).unwrap();
        assert_eq!(index.search(&[1.0], 5).len(), 1);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut index = VectorIndex::new();
        for i in 0..4 {
            index.insert(chunk(&i.to_string(), "a", i), vec![1.0, 1.0]).unwrap();
        }
        let order: Vec<usize> = index
            .search(&[1.0, 1.0], 4)
            .into_iter()
            .map(|s| s.chunk.chunk_index)
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn dimension_mismatch_rejected() {
        let mut index = VectorIndex::new();
        index.insert(chunk("a", "a", 0), vec![1.0, 0.0]).unwrap();
        let err = index.insert(chunk("b", "a", 1), vec![1.0]).unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                expected: 2,
                got: 1
            }
        ));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn empty_vector_rejected() {
        let mut index = VectorIndex::new();
        assert!(matches!(
            index.insert(chunk("a", "a", 0), Vec::new()),
            Err(IndexError::EmptyVector)
        ));
    }

    #[test]
    fn each_index_has_distinct_id() {
        assert_ne!(VectorIndex::new().id(), VectorIndex::new().id());
    }

    #[test]
    fn document_count_counts_sources() {
        let mut index = VectorIndex::new();
        index.insert(chunk("1", "a", 0), vec![1.0]).unwrap();
        index.insert(chunk("2", "a", 1), vec![1.0]).unwrap();
        index.insert(chunk("3", "b", 0), vec![1.0]).unwrap();
        assert_eq!(index.document_count(), 2);
        assert_eq!(index.dimensions(), Some(1));
        assert_eq!(index.chunks().count(), 3);
    }
}
