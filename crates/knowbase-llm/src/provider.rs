use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Sender for short human-readable progress notices.
pub type StatusTx = tokio::sync::mpsc::UnboundedSender<String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Per-request sampling options.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
}

impl ChatOptions {
    #[must_use]
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
        }
    }
}

/// Intent of an embedding request.
///
/// Retrieval-tuned models embed stored passages and search queries into the
/// same space but expect to be told which one they are looking at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedInput {
    SearchDocument,
    SearchQuery,
}

impl EmbedInput {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SearchDocument => "search_document",
            Self::SearchQuery => "search_query",
        }
    }
}

pub trait LlmProvider: Send + Sync {
    /// Send messages to the model and return the full assistant response.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to communicate or the response is invalid.
    fn chat(
        &self,
        messages: &[Message],
        options: ChatOptions,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;

    fn name(&self) -> &str;
}

pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, returning one vector per input in input order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response does not contain
    /// exactly one vector per input.
    fn embed_batch(
        &self,
        texts: &[String],
        input: EmbedInput,
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, LlmError>> + Send;

    /// Embed a single text.
    ///
    /// # Errors
    ///
    /// Same as [`EmbeddingProvider::embed_batch`].
    fn embed(
        &self,
        text: &str,
        input: EmbedInput,
    ) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send {
        let texts = vec![text.to_owned()];
        async move {
            let mut vectors = self.embed_batch(&texts, input).await?;
            if vectors.len() != 1 {
                return Err(LlmError::EmbeddingCount {
                    provider: self.name().to_owned(),
                    expected: 1,
                    got: vectors.len(),
                });
            }
            Ok(vectors.remove(0))
        }
    }

    fn name(&self) -> &str;
}
