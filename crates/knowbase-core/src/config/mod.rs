mod env;
mod types;


pub use types::*;

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::secret::Secret;

/// Startup configuration problems. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Groq API key missing. Add to .env.")]
    MissingChatKey,

    #[error("{provider} API key missing. Add {var} to .env.")]
    MissingEmbeddingKey {
        provider: EmbeddingProviderKind,
        var: &'static str,
    },

    #[error("index.chunk_size must be greater than zero")]
    ZeroChunkSize,

    #[error("index.chunk_overlap ({overlap}) must be smaller than index.chunk_size ({size})")]
    OverlapTooLarge { overlap: usize, size: usize },

    #[error("index.embed_batch_size must be greater than zero")]
    ZeroBatchSize,
}

/// Priority: `--config` argument > `KNOWBASE_CONFIG` > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("KNOWBASE_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist. Credentials are
    /// not read here; see [`Config::resolve_secrets`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Pull API keys from the process environment.
    pub fn resolve_secrets(&mut self) {
        self.secrets.groq_api_key = Secret::from_env(GROQ_API_KEY);
        self.secrets.cohere_api_key = Secret::from_env(COHERE_API_KEY);
        self.secrets.openai_api_key = Secret::from_env(OPENAI_API_KEY);
    }

    /// # Errors
    ///
    /// Returns the first problem found: missing credentials are reported
    /// before invalid index settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secrets.groq_api_key.is_none() {
            return Err(ConfigError::MissingChatKey);
        }
        let kind = self.embedding.provider;
        if self.secrets.embedding_key(kind).is_none() {
            return Err(ConfigError::MissingEmbeddingKey {
                provider: kind,
                var: kind.api_key_var(),
            });
        }
        if self.index.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.index.chunk_overlap >= self.index.chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                overlap: self.index.chunk_overlap,
                size: self.index.chunk_size,
            });
        }
        if self.index.embed_batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }
}
