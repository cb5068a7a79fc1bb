//! Prompt templates for RAG generation

use crate::index::SearchResult;

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the context block from retrieved chunks
    pub fn build_context(results: &[SearchResult]) -> String {
        let mut context = String::new();

        for (i, result) in results.iter().enumerate() {
            context.push_str(&format!(
                "[{}] {}\n\n{}\n\n---\n\n",
                i + 1,
                result.chunk.filename,
                result.chunk.content
            ));
        }

        context
    }

    /// Build the full grounded prompt: the model must answer only from the
    /// retrieved context.
    pub fn build_rag_prompt(question: &str, context: &str) -> String {
        format!(
            r#"You are a document-grounded assistant. Answer the question using ONLY the context below.
If the answer is not in the context, respond with "This information is not available in the provided documents."

CONTEXT FROM DOCUMENTS:
{context}

QUESTION: {question}

Answer:"#,
            context = context,
            question = question
        )
    }
}
