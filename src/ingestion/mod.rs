//! Document ingestion: parsing and chunking

pub mod chunker;
pub mod parser;

pub use chunker::TextChunker;
pub use parser::{FileParser, ParsedDocument};

use crate::error::Result;
use crate::types::{Chunk, Document};

/// Ingestion pipeline tying the parser and chunker together
pub struct IngestPipeline {
    chunker: TextChunker,
}

impl IngestPipeline {
    /// Create a pipeline with the given chunking policy
    pub fn new(chunk_size: usize, chunk_overlap: usize, min_chunk_size: usize) -> Self {
        Self {
            chunker: TextChunker::new(chunk_size, chunk_overlap, min_chunk_size),
        }
    }

    /// Parse raw file bytes into extracted text
    pub fn parse_file(&self, filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        FileParser::parse(filename, data)
    }

    /// Split a parsed document into chunks (embeddings are filled in later)
    pub fn create_chunks(&self, doc: &Document, parsed: &ParsedDocument) -> Vec<Chunk> {
        self.chunker.chunk_document(doc, &parsed.content)
    }
}
