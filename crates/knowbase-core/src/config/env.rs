use std::path::PathBuf;

use super::{Config, EmbeddingProviderKind};

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("KNOWBASE_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("KNOWBASE_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("KNOWBASE_LLM_MAX_TOKENS") {
            if let Ok(n) = v.parse::<u32>() {
                self.llm.max_tokens = n;
            } else {
                tracing::warn!("ignoring invalid KNOWBASE_LLM_MAX_TOKENS value: {v}");
            }
        }
        if let Ok(v) = std::env::var("KNOWBASE_EMBEDDING_PROVIDER") {
            if let Ok(kind) =
                serde_json::from_value::<EmbeddingProviderKind>(serde_json::Value::String(v.clone()))
            {
                self.embedding.provider = kind;
            } else {
                tracing::warn!("ignoring invalid KNOWBASE_EMBEDDING_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("KNOWBASE_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("KNOWBASE_EMBEDDING_BASE_URL") {
            self.embedding.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("KNOWBASE_DOCUMENTS_DIR") {
            self.storage.documents_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("KNOWBASE_INDEX_CHUNK_SIZE") {
            if let Ok(n) = v.parse::<usize>() {
                self.index.chunk_size = n;
            } else {
                tracing::warn!("ignoring invalid KNOWBASE_INDEX_CHUNK_SIZE value: {v}");
            }
        }
        if let Ok(v) = std::env::var("KNOWBASE_INDEX_CHUNK_OVERLAP") {
            if let Ok(n) = v.parse::<usize>() {
                self.index.chunk_overlap = n;
            } else {
                tracing::warn!("ignoring invalid KNOWBASE_INDEX_CHUNK_OVERLAP value: {v}");
            }
        }
        if let Ok(v) = std::env::var("KNOWBASE_INDEX_EMBED_BATCH_SIZE") {
            if let Ok(n) = v.parse::<usize>() {
                self.index.embed_batch_size = n;
            } else {
                tracing::warn!("ignoring invalid KNOWBASE_INDEX_EMBED_BATCH_SIZE value: {v}");
            }
        }
    }
}
