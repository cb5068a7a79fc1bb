//! Document upload endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::time::Instant;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::metrics;
use crate::server::state::AppState;
use crate::types::{response::UploadResponse, Document};

/// POST /upload - Upload a file and index it
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let start = Instant::now();

    let mut filename = None;
    let mut data = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Internal(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        filename = Some(
            field
                .file_name()
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("file_{}.bin", Uuid::new_v4())),
        );
        data = Some(
            field
                .bytes()
                .await
                .map_err(|e| Error::Internal(format!("Failed to read file: {}", e)))?,
        );
        break;
    }

    let (filename, data) = match (filename, data) {
        (Some(f), Some(d)) => (f, d),
        _ => return Err(Error::Internal("Missing 'file' field in upload".to_string())),
    };

    tracing::info!("Processing file: {} ({} bytes)", filename, data.len());

    // Keep the raw upload on disk. A re-upload under the same name
    // overwrites the stored copy but still appends chunks to the index.
    state.document_store().store(&filename, &data).await?;

    let pipeline = state.ingest_pipeline();
    let parsed = pipeline.parse_file(&filename, &data)?;

    let mut doc = Document::new(
        filename.clone(),
        parsed.file_type.clone(),
        parsed.content_hash.clone(),
        data.len() as u64,
    );

    let mut chunks = pipeline.create_chunks(&doc, &parsed);
    if chunks.is_empty() {
        return Err(Error::parse(&filename, "No chunks produced from document"));
    }

    for chunk in chunks.iter_mut() {
        let timer = metrics::EMBEDDING_LATENCY.start_timer();
        let embedding = state.embedder().embed(&chunk.content).await?;
        timer.observe_duration();
        chunk.embedding = embedding;
    }

    doc.total_chunks = chunks.len() as u32;

    // Index insert walks the HNSW graph; keep it off the async runtime.
    let index = std::sync::Arc::clone(state.index());
    let chunk_batch = chunks;
    tokio::task::spawn_blocking(move || index.insert_chunks(&chunk_batch))
        .await
        .map_err(|e| Error::internal(format!("Index task failed: {}", e)))??;

    state.sync_index_gauges();

    tracing::info!(
        "Indexed '{}': {} chunks in {:.1}s",
        filename,
        doc.total_chunks,
        start.elapsed().as_secs_f64()
    );

    Ok(Json(UploadResponse::indexed(filename)))
}
