//! Query endpoint for the RAG pipeline

use axum::{extract::State, Json};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::metrics;
use crate::server::state::AppState;
use crate::types::{query::QueryRequest, response::QueryResponse};

/// POST /query - Answer a question over the indexed documents
pub async fn query_rag(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let start = Instant::now();

    tracing::info!("Query: \"{}\"", request.prompt);

    if state.index().is_empty() {
        return Err(Error::IndexUninitialized);
    }

    let embed_timer = metrics::EMBEDDING_LATENCY.start_timer();
    let query_embedding = state.embedder().embed(&request.prompt).await?;
    embed_timer.observe_duration();

    // HNSW search is CPU-bound; run it off the async runtime.
    let index = Arc::clone(state.index());
    let top_k = state.config().index.top_k;
    let retrieval_timer = metrics::RETRIEVAL_LATENCY.start_timer();
    let search_results = tokio::task::spawn_blocking(move || index.search(&query_embedding, top_k))
        .await
        .map_err(|e| Error::internal(format!("Search task failed: {}", e)))??;
    retrieval_timer.observe_duration();

    tracing::debug!("Retrieved {} chunks", search_results.len());

    let context = PromptBuilder::build_context(&search_results);

    let llm_timer = metrics::LLM_LATENCY.start_timer();
    let answer = state.llm().generate_answer(&request.prompt, &context).await?;
    llm_timer.observe_duration();

    tracing::info!(
        "Query completed in {}ms, {} chunks used",
        start.elapsed().as_millis(),
        search_results.len()
    );

    Ok(Json(QueryResponse { response: answer }))
}
