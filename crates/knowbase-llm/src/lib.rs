//! Chat and embedding provider abstraction and hosted backends.

pub mod any;
pub mod cohere;
pub mod error;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod openai;
pub mod provider;

pub use any::{AnyEmbedder, AnyProvider};
pub use error::LlmError;
pub use provider::{ChatOptions, EmbedInput, EmbeddingProvider, LlmProvider, Message, Role};
