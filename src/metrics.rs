//! Prometheus metrics for the HTTP layer and RAG stages
//!
//! Counter/histogram names follow the `rag_` prefix so dashboards can tell
//! this exporter's series apart from the hosting infrastructure's.

use axum::{extract::Request, middleware::Next, response::Response};
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGauge, Registry, TextEncoder,
};

use crate::error::{Error, Result};

/// Process-wide metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Total requests by method, path, and response status
pub static REQUEST_COUNT: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        prometheus::opts!("rag_requests_total", "Total number of RAG requests"),
        &["method", "path", "status"],
    )
    .expect("valid metric definition");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("register rag_requests_total");
    counter
});

/// Request latency by method and path
pub static REQUEST_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    let histogram = HistogramVec::new(
        prometheus::histogram_opts!(
            "rag_request_latency_seconds",
            "Latency of RAG requests"
        ),
        &["method", "path"],
    )
    .expect("valid metric definition");
    REGISTRY
        .register(Box::new(histogram.clone()))
        .expect("register rag_request_latency_seconds");
    histogram
});

/// Time spent generating embeddings
pub static EMBEDDING_LATENCY: Lazy<prometheus::Histogram> = Lazy::new(|| {
    let histogram = prometheus::Histogram::with_opts(prometheus::histogram_opts!(
        "rag_embedding_latency_seconds",
        "Time spent generating embeddings"
    ))
    .expect("valid metric definition");
    REGISTRY
        .register(Box::new(histogram.clone()))
        .expect("register rag_embedding_latency_seconds");
    histogram
});

/// Time spent retrieving chunks from the index
pub static RETRIEVAL_LATENCY: Lazy<prometheus::Histogram> = Lazy::new(|| {
    let histogram = prometheus::Histogram::with_opts(prometheus::histogram_opts!(
        "rag_retrieval_latency_seconds",
        "Time spent retrieving documents"
    ))
    .expect("valid metric definition");
    REGISTRY
        .register(Box::new(histogram.clone()))
        .expect("register rag_retrieval_latency_seconds");
    histogram
});

/// Time spent generating the LLM response
pub static LLM_LATENCY: Lazy<prometheus::Histogram> = Lazy::new(|| {
    let histogram = prometheus::Histogram::with_opts(prometheus::histogram_opts!(
        "rag_llm_latency_seconds",
        "Time spent generating LLM response"
    ))
    .expect("valid metric definition");
    REGISTRY
        .register(Box::new(histogram.clone()))
        .expect("register rag_llm_latency_seconds");
    histogram
});

/// Documents known to the index
pub static DOCUMENTS_TOTAL: Lazy<IntGauge> = Lazy::new(|| {
    let gauge = IntGauge::new("rag_documents_total", "Documents ingested into the index")
        .expect("valid metric definition");
    REGISTRY
        .register(Box::new(gauge.clone()))
        .expect("register rag_documents_total");
    gauge
});

/// Chunks held by the index
pub static INDEX_CHUNKS: Lazy<IntGauge> = Lazy::new(|| {
    let gauge = IntGauge::new("rag_index_chunks", "Chunks held by the vector index")
        .expect("valid metric definition");
    REGISTRY
        .register(Box::new(gauge.clone()))
        .expect("register rag_index_chunks");
    gauge
});

/// Request-tracking middleware.
///
/// Counts every request by method, path, and outcome status and records its
/// latency. The `/metrics` path is exempt so the exporter never measures
/// itself. Handler errors are mapped to responses before this layer observes
/// them, so failures are still counted under their 4xx/5xx status.
pub async fn track_requests(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    if path == "/metrics" {
        return next.run(req).await;
    }

    let method = req.method().to_string();
    let timer = REQUEST_LATENCY
        .with_label_values(&[&method, &path])
        .start_timer();

    let response = next.run(req).await;

    timer.observe_duration();
    REQUEST_COUNT
        .with_label_values(&[&method, &path, response.status().as_str()])
        .inc();

    response
}

/// Render the registry in the prometheus text exposition format.
pub fn render() -> Result<String> {
    // Touch the lazies so all series appear even before first use.
    Lazy::force(&REQUEST_COUNT);
    Lazy::force(&REQUEST_LATENCY);
    Lazy::force(&EMBEDDING_LATENCY);
    Lazy::force(&RETRIEVAL_LATENCY);
    Lazy::force(&LLM_LATENCY);
    Lazy::force(&DOCUMENTS_TOTAL);
    Lazy::force(&INDEX_CHUNKS);

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| Error::internal(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer).map_err(|e| Error::internal(format!("Invalid metrics UTF-8: {}", e)))
}
