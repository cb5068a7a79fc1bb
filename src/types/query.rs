//! Query request types

use serde::{Deserialize, Serialize};

/// Query request for the RAG pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The natural-language prompt to answer
    pub prompt: String,
}

impl QueryRequest {
    /// Create a new query
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}
