//! Vector index: HNSW search over chunk embeddings with on-disk persistence
//!
//! The ANN structure itself comes from hnsw_rs; this module owns the chunk
//! record table, maps HNSW data ids back to chunks, and persists the records
//! so the index survives restarts. The HNSW graph is rebuilt from the records
//! at load time, which keeps the on-disk format a plain serde document.

use std::fs;
use std::path::{Path, PathBuf};

use hnsw_rs::prelude::*;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::types::Chunk;

/// Filename of the serialized record table inside the index directory
const RECORDS_FILE: &str = "chunks.json";

/// Search result with chunk and similarity
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity (0.0-1.0, higher is better)
    pub similarity: f32,
}

/// Persisted form of the record table
#[derive(Serialize, Deserialize)]
struct IndexSnapshot {
    chunks: Vec<Chunk>,
    /// Distinct documents represented in the record table
    document_count: usize,
}

struct IndexInner {
    /// Chunk records; position in this vec is the HNSW data id
    chunks: Vec<Chunk>,
    /// HNSW graph over the embeddings
    hnsw: Hnsw<'static, f32, DistCosine>,
    /// Distinct documents seen (uploads, not deduplicated filenames)
    document_count: usize,
}

/// Vector index over chunk embeddings
pub struct VectorIndex {
    inner: RwLock<IndexInner>,
    config: IndexConfig,
    records_path: PathBuf,
}

impl VectorIndex {
    /// Open the index: load a prior snapshot from `dir` if one exists,
    /// otherwise create an empty index and persist it immediately.
    pub fn open(dir: &Path, config: &IndexConfig) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let records_path = dir.join(RECORDS_FILE);

        let index = if records_path.exists() {
            let content = fs::read_to_string(&records_path)?;
            let snapshot: IndexSnapshot = serde_json::from_str(&content)
                .map_err(|e| Error::index(format!("Corrupt index snapshot: {}", e)))?;
            tracing::info!(
                "Loading existing index ({} chunks, {} documents)",
                snapshot.chunks.len(),
                snapshot.document_count
            );
            Self::from_snapshot(snapshot, config, records_path)?
        } else {
            tracing::info!("Creating new empty index");
            let index = Self {
                inner: RwLock::new(IndexInner {
                    chunks: Vec::new(),
                    hnsw: Self::new_hnsw(config),
                    document_count: 0,
                }),
                config: config.clone(),
                records_path,
            };
            index.persist()?;
            index
        };

        Ok(index)
    }

    fn new_hnsw(config: &IndexConfig) -> Hnsw<'static, f32, DistCosine> {
        Hnsw::new(
            config.hnsw_m,
            config.max_elements,
            16, // max layers
            config.hnsw_ef_construction,
            DistCosine {},
        )
    }

    fn from_snapshot(
        snapshot: IndexSnapshot,
        config: &IndexConfig,
        records_path: PathBuf,
    ) -> Result<Self> {
        let hnsw = Self::new_hnsw(config);
        for (position, chunk) in snapshot.chunks.iter().enumerate() {
            if chunk.embedding.len() != config.dimensions {
                return Err(Error::index(format!(
                    "Chunk {} in snapshot has {} dimensions, index expects {}",
                    chunk.id,
                    chunk.embedding.len(),
                    config.dimensions
                )));
            }
            hnsw.insert((&chunk.embedding, position));
        }

        Ok(Self {
            inner: RwLock::new(IndexInner {
                chunks: snapshot.chunks,
                hnsw,
                document_count: snapshot.document_count,
            }),
            config: config.clone(),
            records_path,
        })
    }

    /// Insert chunks for one document and persist the updated index.
    ///
    /// Persistence is synchronous and the write lock is held through the disk
    /// commit, so concurrent inserts serialize and snapshots reach disk in
    /// insertion order. When this returns Ok, the on-disk snapshot includes
    /// the new chunks. There is no rollback — a persist failure leaves the
    /// in-memory index ahead of the disk copy until the next successful
    /// persist.
    pub fn insert_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        for chunk in chunks {
            if chunk.embedding.is_empty() {
                return Err(Error::index(format!("Chunk {} has no embedding", chunk.id)));
            }
            if chunk.embedding.len() != self.config.dimensions {
                return Err(Error::index(format!(
                    "Chunk {} embedding has {} dimensions, index expects {}",
                    chunk.id,
                    chunk.embedding.len(),
                    self.config.dimensions
                )));
            }
        }

        let mut inner = self.inner.write();
        for chunk in chunks {
            let position = inner.chunks.len();
            inner.hnsw.insert((&chunk.embedding, position));
            inner.chunks.push(chunk.clone());
        }
        inner.document_count += 1;

        let snapshot = IndexSnapshot {
            chunks: inner.chunks.clone(),
            document_count: inner.document_count,
        };
        self.write_snapshot(&snapshot)
    }

    /// Search for the most similar chunks
    pub fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let inner = self.inner.read();

        if inner.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let query = query_embedding.to_vec();
        let neighbours = inner
            .hnsw
            .search(&query, top_k.min(inner.chunks.len()), self.config.hnsw_ef_search);

        let mut results = Vec::with_capacity(neighbours.len());
        for neighbour in neighbours {
            let Some(chunk) = inner.chunks.get(neighbour.d_id) else {
                continue;
            };
            // DistCosine yields 1 - cos(a, b)
            let similarity = 1.0 - neighbour.distance;
            results.push(SearchResult {
                chunk: chunk.clone(),
                similarity,
            });
        }

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(results)
    }

    /// Number of chunks held by the index
    pub fn len(&self) -> usize {
        self.inner.read().chunks.len()
    }

    /// True if no chunks have ever been inserted
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of documents represented in the index
    pub fn document_count(&self) -> usize {
        self.inner.read().document_count
    }

    /// Snapshot the current record table to disk. Inserts commit their own
    /// snapshot under the write lock; this is for writing the initial empty
    /// snapshot at open.
    pub fn persist(&self) -> Result<()> {
        let snapshot = {
            let inner = self.inner.read();
            IndexSnapshot {
                chunks: inner.chunks.clone(),
                document_count: inner.document_count,
            }
        };
        self.write_snapshot(&snapshot)
    }

    /// Staged commit: serialize to a temp file in the same directory, then
    /// atomically rename over the snapshot, so a crash mid-write cannot leave
    /// a torn index file.
    fn write_snapshot(&self, snapshot: &IndexSnapshot) -> Result<()> {
        let content = serde_json::to_string(snapshot)?;
        let tmp_path = self.records_path.with_extension("json.tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.records_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Document, FileType};
    use uuid::Uuid;

    fn test_config() -> IndexConfig {
        IndexConfig {
            dimensions: 4,
            ..IndexConfig::default()
        }
    }

    fn chunk_with_embedding(doc_id: Uuid, content: &str, embedding: Vec<f32>) -> Chunk {
        let mut chunk = Chunk::new(doc_id, "test.txt".to_string(), content.to_string(), 0, 0, 0);
        chunk.embedding = embedding;
        chunk
    }

    #[test]
    fn open_creates_empty_index_and_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let index = VectorIndex::open(dir.path(), &test_config()).unwrap();
        assert!(index.is_empty());
        assert!(dir.path().join(RECORDS_FILE).exists());
    }

    #[test]
    fn insert_and_search_returns_nearest() {
        let dir = tempfile::tempdir().unwrap();
        let index = VectorIndex::open(dir.path(), &test_config()).unwrap();
        let doc = Document::new("test.txt".into(), FileType::Txt, "h".into(), 0);

        index
            .insert_chunks(&[
                chunk_with_embedding(doc.id, "north", vec![1.0, 0.0, 0.0, 0.0]),
                chunk_with_embedding(doc.id, "east", vec![0.0, 1.0, 0.0, 0.0]),
                chunk_with_embedding(doc.id, "up", vec![0.0, 0.0, 1.0, 0.0]),
            ])
            .unwrap();

        let results = index.search(&[0.9, 0.1, 0.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.content, "north");
        assert!(results[0].similarity > results[1].similarity);
    }

    #[test]
    fn rejects_chunks_without_embeddings() {
        let dir = tempfile::tempdir().unwrap();
        let index = VectorIndex::open(dir.path(), &test_config()).unwrap();
        let doc = Document::new("test.txt".into(), FileType::Txt, "h".into(), 0);

        let bare = Chunk::new(doc.id, "test.txt".into(), "text".into(), 0, 0, 0);
        assert!(index.insert_chunks(&[bare]).is_err());
    }

    #[test]
    fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let doc = Document::new("test.txt".into(), FileType::Txt, "h".into(), 0);

        {
            let index = VectorIndex::open(dir.path(), &test_config()).unwrap();
            index
                .insert_chunks(&[chunk_with_embedding(
                    doc.id,
                    "persisted fact",
                    vec![0.5, 0.5, 0.0, 0.0],
                )])
                .unwrap();
        }

        let reopened = VectorIndex::open(dir.path(), &test_config()).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.document_count(), 1);

        let results = reopened.search(&[0.5, 0.5, 0.0, 0.0], 1).unwrap();
        assert_eq!(results[0].chunk.content, "persisted fact");
        assert!(results[0].similarity > 0.99);
    }

    #[test]
    fn repeated_inserts_accumulate_without_dedup() {
        let dir = tempfile::tempdir().unwrap();
        let index = VectorIndex::open(dir.path(), &test_config()).unwrap();
        let doc = Document::new("test.txt".into(), FileType::Txt, "h".into(), 0);

        let chunk = chunk_with_embedding(doc.id, "same content", vec![1.0, 0.0, 0.0, 0.0]);
        index.insert_chunks(std::slice::from_ref(&chunk)).unwrap();
        let second = chunk_with_embedding(doc.id, "same content", vec![1.0, 0.0, 0.0, 0.0]);
        index.insert_chunks(&[second]).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.document_count(), 2);
    }

    #[test]
    fn rejects_mismatched_embedding_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let index = VectorIndex::open(dir.path(), &test_config()).unwrap();
        let doc = Document::new("test.txt".into(), FileType::Txt, "h".into(), 0);

        let narrow = chunk_with_embedding(doc.id, "text", vec![1.0, 0.0]);
        assert!(index.insert_chunks(&[narrow]).is_err());
        assert!(index.is_empty());
    }

    #[test]
    fn concurrent_inserts_all_reach_disk() {
        let dir = tempfile::tempdir().unwrap();
        let index = std::sync::Arc::new(VectorIndex::open(dir.path(), &test_config()).unwrap());
        let doc = Document::new("test.txt".into(), FileType::Txt, "h".into(), 0);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let index = std::sync::Arc::clone(&index);
                let doc_id = doc.id;
                std::thread::spawn(move || {
                    let chunk = chunk_with_embedding(
                        doc_id,
                        &format!("chunk {}", i),
                        vec![i as f32 + 1.0, 1.0, 0.0, 0.0],
                    );
                    index.insert_chunks(&[chunk]).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Every insert committed its snapshot in order, so the last rename
        // holds all eight chunks.
        let reopened = VectorIndex::open(dir.path(), &test_config()).unwrap();
        assert_eq!(reopened.len(), 8);
        assert_eq!(reopened.document_count(), 8);
    }

    #[test]
    fn search_on_empty_index_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let index = VectorIndex::open(dir.path(), &test_config()).unwrap();
        assert!(index.search(&[1.0, 0.0, 0.0, 0.0], 3).unwrap().is_empty());
    }
}
