use std::path::PathBuf;

use knowbase_llm::cohere::{COHERE_BASE_URL, DEFAULT_EMBED_MODEL};
use knowbase_llm::openai::{GROQ_BASE_URL, GROQ_DEFAULT_MODEL, OPENAI_BASE_URL};
use knowbase_memory::IndexerConfig;
use knowbase_memory::document::SplitterConfig;
use serde::{Deserialize, Serialize};

use crate::secret::Secret;

pub const GROQ_API_KEY: &str = "GROQ_API_KEY";
pub const COHERE_API_KEY: &str = "COHERE_API_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

fn default_llm_base_url() -> String {
    GROQ_BASE_URL.into()
}

fn default_llm_model() -> String {
    GROQ_DEFAULT_MODEL.into()
}

fn default_max_tokens() -> u32 {
    1024
}

/// Chat completion backend. Any OpenAI-compatible endpoint works; the
/// default is Groq.
#[derive(Debug, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    #[default]
    Cohere,
    OpenAi,
}

impl EmbeddingProviderKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cohere => "cohere",
            Self::OpenAi => "openai",
        }
    }

    #[must_use]
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Cohere => COHERE_BASE_URL,
            Self::OpenAi => OPENAI_BASE_URL,
        }
    }

    #[must_use]
    pub fn api_key_var(self) -> &'static str {
        match self {
            Self::Cohere => COHERE_API_KEY,
            Self::OpenAi => OPENAI_API_KEY,
        }
    }
}

impl std::fmt::Display for EmbeddingProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_embedding_model() -> String {
    DEFAULT_EMBED_MODEL.into()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProviderKind,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Overrides the provider's public endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            model: default_embedding_model(),
            base_url: None,
        }
    }
}

impl EmbeddingConfig {
    #[must_use]
    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("data/doc")
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            documents_dir: default_documents_dir(),
        }
    }
}

fn default_chunk_size() -> usize {
    1024
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_embed_batch_size() -> usize {
    knowbase_memory::indexer::DEFAULT_EMBED_BATCH_SIZE
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Serialize)]
pub struct IndexConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_true")]
    pub sentence_aware: bool,
    #[serde(default = "default_embed_batch_size")]
    pub embed_batch_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            sentence_aware: true,
            embed_batch_size: default_embed_batch_size(),
        }
    }
}

impl IndexConfig {
    #[must_use]
    pub fn to_indexer_config(&self) -> IndexerConfig {
        IndexerConfig {
            splitter: SplitterConfig {
                chunk_size: self.chunk_size,
                chunk_overlap: self.chunk_overlap,
                sentence_aware: self.sentence_aware,
            },
            embed_batch_size: self.embed_batch_size,
        }
    }
}

/// Credentials read from the process environment, never from the TOML file.
#[derive(Debug, Default)]
pub struct ResolvedSecrets {
    pub groq_api_key: Option<Secret>,
    pub cohere_api_key: Option<Secret>,
    pub openai_api_key: Option<Secret>,
}

impl ResolvedSecrets {
    #[must_use]
    pub fn embedding_key(&self, kind: EmbeddingProviderKind) -> Option<&Secret> {
        match kind {
            EmbeddingProviderKind::Cohere => self.cohere_api_key.as_ref(),
            EmbeddingProviderKind::OpenAi => self.openai_api_key.as_ref(),
        }
    }
}
