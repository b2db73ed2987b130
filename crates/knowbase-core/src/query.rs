//! Grounded retrieval-augmented answering over a built [`VectorIndex`].

use std::time::{Duration, Instant};

use knowbase_llm::provider::{ChatOptions, EmbedInput, EmbeddingProvider, LlmProvider, Message};
use knowbase_llm::LlmError;
use knowbase_memory::{ScoredChunk, VectorIndex};

/// Number of chunks retrieved per question.
pub const SIMILARITY_TOP_K: usize = 5;

pub const ANSWER_TEMPERATURE: f32 = 0.1;

pub const FALLBACK_ANSWER: &str = "I don't have that information in the uploaded documents.";

pub const QA_TEMPLATE: &str = "Context information is below.\n\
---------------------\n\
{context_str}\n\
---------------------\n\
Given the context information and not prior knowledge, answer the query. \
If you cannot find the answer in the context, say 'I don't have that information in the uploaded documents.'\n\
Query: {query_str}\n\
Answer: ";

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("failed to embed query: {0}")]
    Embedding(#[source] LlmError),

    #[error("failed to generate answer: {0}")]
    Generation(#[source] LlmError),
}

#[derive(Debug, Clone)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<ScoredChunk>,
    pub elapsed: Duration,
}

/// Substitute the retrieved context and the query into [`QA_TEMPLATE`].
#[must_use]
pub fn render_prompt(sources: &[ScoredChunk], query: &str) -> String {
    let context = sources
        .iter()
        .map(|s| s.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    QA_TEMPLATE
        .replace("{context_str}", &context)
        .replace("{query_str}", query)
}

pub struct QueryEngine<P, E> {
    provider: P,
    embedder: E,
}

impl<P: LlmProvider, E: EmbeddingProvider> QueryEngine<P, E> {
    #[must_use]
    pub fn new(provider: P, embedder: E) -> Self {
        Self { provider, embedder }
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    #[must_use]
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Retrieve the closest chunks for `prompt` and ask the model once.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Embedding`] if the query cannot be embedded and
    /// [`QueryError::Generation`] if the chat call fails.
    pub async fn query(&self, index: &VectorIndex, prompt: &str) -> Result<QueryResult, QueryError> {
        let started = Instant::now();

        let query_vector = self
            .embedder
            .embed(prompt, EmbedInput::SearchQuery)
            .await
            .map_err(QueryError::Embedding)?;

        let sources = index.search(&query_vector, SIMILARITY_TOP_K);
        tracing::debug!(
            index = %index.id(),
            retrieved = sources.len(),
            top_score = sources.first().map(|s| s.score),
            "retrieved context"
        );

        let rendered = render_prompt(&sources, prompt);
        let answer = self
            .provider
            .chat(
                &[Message::user(rendered)],
                ChatOptions::with_temperature(ANSWER_TEMPERATURE),
            )
            .await
            .map_err(QueryError::Generation)?;

        let elapsed = started.elapsed();
        tracing::info!(
            model = self.provider.name(),
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "answered query"
        );

        Ok(QueryResult {
            answer,
            sources,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use knowbase_llm::mock::{MockEmbedder, MockProvider};
    use knowbase_memory::{Chunk, DocumentMetadata};

    use super::*;

    fn chunk(text: &str, idx: usize) -> Chunk {
        Chunk {
            content: text.to_owned(),
            metadata: DocumentMetadata {
                source: "/docs/notes.txt".into(),
                file_name: "notes.txt".into(),
                content_type: "text/plain".into(),
            },
            chunk_index: idx,
        }
    }

    fn index_of(embedder: &MockEmbedder, texts: &[&str]) -> VectorIndex {
        let mut index = VectorIndex::new();
        for (i, t) in texts.iter().enumerate() {
            index.insert(chunk(t, i), embedder.vectorize(t)).unwrap();
        }
        index
    }

    #[test]
    fn template_renders_context_and_query() {
        let sources = vec![
            ScoredChunk {
                chunk: chunk("first", 0),
                score: 0.9,
            },
            ScoredChunk {
                chunk: chunk("second", 1),
                score: 0.5,
            },
        ];
        let prompt = render_prompt(&sources, "what?");
        assert!(prompt.starts_with("Context information is below.\n---------------------\nfirst\n\nsecond\n---------------------\n"));
        assert!(prompt.contains(FALLBACK_ANSWER));
        assert!(prompt.ends_with("Query: what?\nAnswer: "));
    }

    #[tokio::test]
    async fn query_uses_search_query_mode_and_low_temperature() {
        let embedder = MockEmbedder::default();
        let index = index_of(&embedder, &["The capital of France is Paris."]);
        let provider = MockProvider::with_responses(vec!["Paris".into()]);
        let engine = QueryEngine::new(provider, embedder);

        let result = engine.query(&index, "capital of France?").await.unwrap();

        assert_eq!(result.answer, "Paris");
        assert_eq!(result.sources.len(), 1);
        assert_eq!(engine.embedder().inputs(), vec![EmbedInput::SearchQuery]);
        let calls = engine.provider().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].options.temperature, Some(ANSWER_TEMPERATURE));
        assert_eq!(calls[0].messages.len(), 1);
        assert!(calls[0].messages[0].content.contains("The capital of France is Paris."));
    }

    #[tokio::test]
    async fn retrieves_at_most_top_k() {
        let embedder = MockEmbedder::default();
        let texts: Vec<String> = (0..8).map(|i| format!("fact number {i}")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let index = index_of(&embedder, &refs);
        let engine = QueryEngine::new(MockProvider::default(), embedder);

        let result = engine.query(&index, "fact").await.unwrap();
        assert_eq!(result.sources.len(), SIMILARITY_TOP_K);
    }

    #[tokio::test]
    async fn embedding_failure_is_typed() {
        let index = VectorIndex::new();
        let engine = QueryEngine::new(MockProvider::default(), MockEmbedder::failing());
        let err = engine.query(&index, "q").await.unwrap_err();
        assert!(matches!(err, QueryError::Embedding(_)));
        assert!(engine.provider().calls().is_empty());
    }

    #[tokio::test]
    async fn generation_failure_is_typed() {
        let embedder = MockEmbedder::default();
        let index = index_of(&embedder, &["text"]);
        let engine = QueryEngine::new(MockProvider::failing(), embedder);
        let err = engine.query(&index, "q").await.unwrap_err();
        assert!(matches!(err, QueryError::Generation(_)));
        assert!(err.to_string().starts_with("failed to generate answer"));
    }
}
