//! Construction of providers and pipeline parts from a validated [`Config`].

use anyhow::Context;
use knowbase_llm::any::{AnyEmbedder, AnyProvider};
use knowbase_llm::cohere::CohereEmbedder;
use knowbase_llm::openai::OpenAiProvider;
use knowbase_memory::{DocumentStore, IndexerConfig};
use tokio::sync::watch;

use crate::config::{Config, EmbeddingProviderKind};

/// # Errors
///
/// Returns an error if the chat API key has not been resolved.
pub fn create_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let key = config
        .secrets
        .groq_api_key
        .as_ref()
        .context("Groq API key missing. Add to .env.")?;
    let provider = OpenAiProvider::new(
        "groq",
        key.expose().to_owned(),
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        config.llm.max_tokens,
    );
    tracing::info!(
        base_url = %config.llm.base_url,
        model = %config.llm.model,
        "chat provider configured"
    );
    Ok(AnyProvider::OpenAi(provider))
}

/// # Errors
///
/// Returns an error if the embedding API key has not been resolved.
pub fn create_embedder(config: &Config) -> anyhow::Result<AnyEmbedder> {
    let kind = config.embedding.provider;
    let key = config
        .secrets
        .embedding_key(kind)
        .with_context(|| format!("{kind} API key missing. Add {} to .env.", kind.api_key_var()))?
        .expose()
        .to_owned();
    let base_url = config.embedding.effective_base_url().to_owned();
    let model = config.embedding.model.clone();

    tracing::info!(provider = %kind, model = %model, "embedding provider configured");
    Ok(match kind {
        EmbeddingProviderKind::Cohere => {
            AnyEmbedder::Cohere(CohereEmbedder::new(key, base_url, model))
        }
        EmbeddingProviderKind::OpenAi => AnyEmbedder::OpenAi(
            OpenAiProvider::new("openai", key, base_url, model.clone(), 0)
                .with_embedding_model(model),
        ),
    })
}

/// Indexer settings from `[index]`, with the batch size capped at what the
/// embedding backend accepts per request.
#[must_use]
pub fn indexer_config(config: &Config, embedder: &AnyEmbedder) -> IndexerConfig {
    let mut indexer = config.index.to_indexer_config();
    if let Some(max) = embedder.max_batch()
        && indexer.embed_batch_size > max
    {
        tracing::warn!(
            configured = indexer.embed_batch_size,
            max,
            "embed_batch_size exceeds backend limit, capping"
        );
        indexer.embed_batch_size = max;
    }
    indexer
}

#[must_use]
pub fn document_store(config: &Config) -> DocumentStore {
    DocumentStore::new(&config.storage.documents_dir)
}

#[must_use]
pub fn build_shutdown() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}
