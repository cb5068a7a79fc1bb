//! minirag: a minimal RAG service with document ingestion and Ollama-backed answers
//!
//! This crate wires together document ingestion, an HNSW vector index, and an
//! LLM-backed query pipeline behind a small HTTP API. The heavy lifting
//! (similarity search, embeddings, generation) is delegated to hnsw_rs and the
//! Ollama HTTP API; this crate is the orchestration around them.

pub mod config;
pub mod error;
pub mod generation;
pub mod index;
pub mod ingestion;
pub mod metrics;
pub mod providers;
pub mod server;
pub mod storage;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use types::{
    document::{Chunk, Document, FileType},
    query::QueryRequest,
    response::{QueryResponse, UploadResponse},
};
