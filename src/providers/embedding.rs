//! Embedding provider trait

use async_trait::async_trait;

use crate::error::Result;

/// Generates embedding vectors for text
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
