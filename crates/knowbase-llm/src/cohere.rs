//! Cohere embed API (v2) backend.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::http::normalize_base_url;
use crate::provider::{EmbedInput, EmbeddingProvider};

pub const COHERE_BASE_URL: &str = "https://api.cohere.com";
pub const DEFAULT_EMBED_MODEL: &str = "embed-english-v3.0";

/// Maximum number of texts Cohere accepts in a single embed call.
pub const MAX_BATCH: usize = 96;

#[derive(Clone)]
pub struct CohereEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl fmt::Debug for CohereEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CohereEmbedder")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl CohereEmbedder {
    #[must_use]
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: crate::http::default_client(),
            api_key,
            base_url: normalize_base_url(base_url),
            model,
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl EmbeddingProvider for CohereEmbedder {
    async fn embed_batch(
        &self,
        texts: &[String],
        input: EmbedInput,
    ) -> Result<Vec<Vec<f32>>, LlmError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.len() > MAX_BATCH {
            return Err(LlmError::Other(format!(
                "cohere accepts at most {MAX_BATCH} texts per request, got {}",
                texts.len()
            )));
        }

        let body = EmbedRequest {
            model: &self.model,
            texts,
            input_type: input.as_str(),
            embedding_types: &["float"],
        };

        tracing::debug!(
            model = %self.model,
            texts = texts.len(),
            input_type = input.as_str(),
            "sending cohere embed request"
        );

        let response = self
            .client
            .post(format!("{}/v2/embed", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.map_err(LlmError::Http)?;

        if !status.is_success() {
            tracing::error!(%status, "cohere embed request failed: {text}");
            return Err(LlmError::from_status("cohere", status));
        }

        let resp: EmbedResponse = serde_json::from_str(&text)?;
        let vectors = resp.embeddings.float;
        if vectors.len() != texts.len() {
            return Err(LlmError::EmbeddingCount {
                provider: "cohere".into(),
                expected: texts.len(),
                got: vectors.len(),
            });
        }
        Ok(vectors)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "cohere"
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    texts: &'a [String],
    input_type: &'a str,
    embedding_types: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: EmbeddingsByType,
}

#[derive(Deserialize)]
struct EmbeddingsByType {
    #[serde(default)]
    float: Vec<Vec<f32>>,
}
