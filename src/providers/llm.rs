//! LLM provider trait

use async_trait::async_trait;

use crate::error::Result;

/// Generates an answer from a prompt and retrieved context
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate an answer for the question given the retrieved context
    async fn generate_answer(&self, question: &str, context: &str) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model identifier used for generation
    fn model(&self) -> &str;
}
