//! Shared types for documents, queries, and responses

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, Document, FileType};
pub use query::QueryRequest;
pub use response::{HealthResponse, QueryResponse, UploadResponse};
