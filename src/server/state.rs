//! Application state for the RAG server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::index::VectorIndex;
use crate::ingestion::IngestPipeline;
use crate::metrics;
use crate::providers::{EmbeddingProvider, LlmProvider, OllamaClient, OllamaEmbedder, OllamaLlm};
use crate::storage::DocumentStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Vector index over chunk embeddings
    index: Arc<VectorIndex>,
    /// Filesystem store for raw uploads
    document_store: DocumentStore,
    /// Embedding provider
    embedder: Arc<dyn EmbeddingProvider>,
    /// LLM provider
    llm: Arc<dyn LlmProvider>,
}

impl AppState {
    /// Create application state with Ollama providers
    pub fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing RAG application state...");

        let client = Arc::new(OllamaClient::new(&config.llm)?);
        let embedder = Arc::new(OllamaEmbedder::from_client(
            Arc::clone(&client),
            config.llm.embed_model.clone(),
        ));
        let llm = Arc::new(OllamaLlm::from_client(
            Arc::clone(&client),
            config.llm.generate_model.clone(),
        ));
        tracing::info!(
            "Ollama providers initialized (embed: {}, generate: {})",
            config.llm.embed_model,
            config.llm.generate_model
        );

        Self::with_providers(config, embedder, llm)
    }

    /// Create application state with explicit providers.
    ///
    /// This is the seam tests use to inject deterministic embedders and LLMs.
    pub fn with_providers(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        let index = Arc::new(VectorIndex::open(&config.storage.index_dir, &config.index)?);
        tracing::info!(
            "Vector index opened ({} chunks, {} documents)",
            index.len(),
            index.document_count()
        );

        let document_store = DocumentStore::new(&config.storage.upload_dir)?;

        let state = Self {
            inner: Arc::new(AppStateInner {
                config,
                index,
                document_store,
                embedder,
                llm,
            }),
        };
        state.sync_index_gauges();

        Ok(state)
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the vector index
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.inner.index
    }

    /// Get the document store
    pub fn document_store(&self) -> &DocumentStore {
        &self.inner.document_store
    }

    /// Get the embedding provider
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedder
    }

    /// Get the LLM provider
    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm
    }

    /// Build an ingestion pipeline from the configured chunking policy
    pub fn ingest_pipeline(&self) -> IngestPipeline {
        let chunking = &self.inner.config.chunking;
        IngestPipeline::new(
            chunking.chunk_size,
            chunking.chunk_overlap,
            chunking.min_chunk_size,
        )
    }

    /// Push current index counts into the exported gauges
    pub fn sync_index_gauges(&self) {
        metrics::DOCUMENTS_TOTAL.set(self.inner.index.document_count() as i64);
        metrics::INDEX_CHUNKS.set(self.inner.index.len() as i64);
    }
}
