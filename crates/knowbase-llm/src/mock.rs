//! Test-only mock chat and embedding providers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::{ChatOptions, EmbedInput, EmbeddingProvider, LlmProvider, Message};

/// A recorded `chat` invocation.
#[derive(Debug, Clone)]
pub struct ChatCall {
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<String>>>,
    calls: Arc<Mutex<Vec<ChatCall>>>,
    pub default_response: String,
    pub fail_chat: bool,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
            fail_chat: false,
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_chat: true,
            ..Self::default()
        }
    }

    /// Every `chat` call seen so far, including failed ones.
    ///
    /// # Panics
    ///
    /// Panics if the call log mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<ChatCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl LlmProvider for MockProvider {
    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(ChatCall {
            messages: messages.to_vec(),
            options,
        });
        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}

/// Deterministic bag-of-words embedder.
///
/// Each lowercase alphanumeric token is hashed into one of `dimensions`
/// buckets, so texts sharing words land close together under cosine
/// similarity and identical texts always map to identical vectors.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    pub dimensions: usize,
    pub fail: bool,
    batches: Arc<AtomicUsize>,
    inputs: Arc<Mutex<Vec<EmbedInput>>>,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self {
            dimensions: 64,
            fail: false,
            batches: Arc::new(AtomicUsize::new(0)),
            inputs: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockEmbedder {
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of `embed_batch` calls made so far.
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.batches.load(Ordering::Relaxed)
    }

    /// Input mode of every `embed_batch` call, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the input log mutex is poisoned.
    #[must_use]
    pub fn inputs(&self) -> Vec<EmbedInput> {
        self.inputs.lock().unwrap().clone()
    }

    #[must_use]
    pub fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions.max(1)];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            let hash = token
                .bytes()
                .fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
                    (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
                });
            #[allow(clippy::cast_possible_truncation)]
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }
        vector
    }
}

impl EmbeddingProvider for MockEmbedder {
    async fn embed_batch(
        &self,
        texts: &[String],
        input: EmbedInput,
    ) -> Result<Vec<Vec<f32>>, LlmError> {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.inputs.lock().unwrap().push(input);
        if self.fail {
            return Err(LlmError::Other("mock embedding error".into()));
        }
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn provider_pops_queued_responses_then_default() {
        let p = MockProvider::with_responses(vec!["first".into()]);
        let opts = ChatOptions::default();
        assert_eq!(p.chat(&[], opts).await.unwrap(), "first");
        assert_eq!(p.chat(&[], opts).await.unwrap(), "mock response");
        assert_eq!(p.calls().len(), 2);
    }

    #[tokio::test]
    async fn failing_provider_still_records_call() {
        let p = MockProvider::failing();
        assert!(p.chat(&[Message::user("q")], ChatOptions::default()).await.is_err());
        assert_eq!(p.calls()[0].messages[0].content, "q");
    }

    #[test]
    fn vectorize_is_deterministic_and_case_insensitive() {
        let e = MockEmbedder::default();
        assert_eq!(e.vectorize("Paris France"), e.vectorize("paris, france"));
        assert_eq!(e.vectorize("x").len(), 64);
    }

    #[tokio::test]
    async fn embedder_records_input_modes() {
        let e = MockEmbedder::default();
        e.embed_batch(&["a".into()], EmbedInput::SearchDocument)
            .await
            .unwrap();
        e.embed("b", EmbedInput::SearchQuery).await.unwrap();
        assert_eq!(e.batch_count(), 2);
        assert_eq!(
            e.inputs(),
            vec![EmbedInput::SearchDocument, EmbedInput::SearchQuery]
        );
    }
}
