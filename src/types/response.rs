//! Response types for the HTTP surface

use serde::{Deserialize, Serialize};

/// Response to a successful upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Original filename as uploaded
    pub filename: String,
    /// Human-readable status
    pub status: String,
}

impl UploadResponse {
    /// Build the standard success response for an indexed file
    pub fn indexed(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            status: "Indexed successfully".to_string(),
        }
    }
}

/// Response to a query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Generated answer text, returned verbatim from the LLM
    pub response: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "running" while the process serves requests
    pub status: String,
}

impl HealthResponse {
    pub fn running() -> Self {
        Self {
            status: "running".to_string(),
        }
    }
}
