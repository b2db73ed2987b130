use crate::cohere::CohereEmbedder;
use crate::error::LlmError;
#[cfg(feature = "mock")]
use crate::mock::{MockEmbedder, MockProvider};
use crate::openai::OpenAiProvider;
use crate::provider::{ChatOptions, EmbedInput, EmbeddingProvider, LlmProvider, Message};

/// Generates a match over all variants of a provider enum, binding the inner
/// provider and evaluating the given expression for each arm.
macro_rules! delegate_provider {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyProvider::OpenAi($p) => $expr,
            #[cfg(feature = "mock")]
            AnyProvider::Mock($p) => $expr,
        }
    };
}

macro_rules! delegate_embedder {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyEmbedder::Cohere($p) => $expr,
            AnyEmbedder::OpenAi($p) => $expr,
            #[cfg(feature = "mock")]
            AnyEmbedder::Mock($p) => $expr,
        }
    };
}

/// Chat backend selected at runtime from configuration.
#[derive(Debug, Clone)]
pub enum AnyProvider {
    OpenAi(OpenAiProvider),
    #[cfg(feature = "mock")]
    Mock(MockProvider),
}

impl LlmProvider for AnyProvider {
    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<String, LlmError> {
        delegate_provider!(self, |p| p.chat(messages, options).await)
    }

    fn name(&self) -> &str {
        delegate_provider!(self, |p| LlmProvider::name(p))
    }
}

/// Embedding backend selected at runtime from configuration.
#[derive(Debug, Clone)]
pub enum AnyEmbedder {
    Cohere(CohereEmbedder),
    OpenAi(OpenAiProvider),
    #[cfg(feature = "mock")]
    Mock(MockEmbedder),
}

impl EmbeddingProvider for AnyEmbedder {
    async fn embed_batch(
        &self,
        texts: &[String],
        input: EmbedInput,
    ) -> Result<Vec<Vec<f32>>, LlmError> {
        delegate_embedder!(self, |p| p.embed_batch(texts, input).await)
    }

    fn name(&self) -> &str {
        delegate_embedder!(self, |p| EmbeddingProvider::name(p))
    }
}

impl AnyEmbedder {
    /// Largest batch the backend accepts in one request, if it has a limit.
    #[must_use]
    pub fn max_batch(&self) -> Option<usize> {
        match self {
            Self::Cohere(_) => Some(crate::cohere::MAX_BATCH),
            _ => None,
        }
    }
}
