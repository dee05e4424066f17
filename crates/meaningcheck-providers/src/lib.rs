//! meaningcheck-providers: chat and embedding backend integrations.
//!
//! Implements the core `ChatBackend` trait for OpenAI, Azure OpenAI and
//! Ollama, and the `Embedder` trait for OpenAI and Ollama embeddings.

pub mod azure;
pub mod config;
pub mod error;
mod http;
pub mod mock;
pub mod ollama;
pub mod openai;

pub use config::{
    create_chat_backend, create_similarity_backend, load_config, load_config_from, ChatConfig,
    EmbeddingConfig, MeaningcheckConfig,
};
pub use error::ProviderError;
