//! Provider abstractions for embeddings and generation
//!
//! Trait seams keep the pipelines independent of the concrete backend;
//! production uses Ollama, tests inject deterministic mocks.

pub mod embedding;
pub mod llm;
pub mod ollama;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
