//! Text chunking with fixed size and overlap

use unicode_segmentation::UnicodeSegmentation;

use crate::types::{Chunk, Document};

/// Text chunker with configurable size and overlap.
///
/// Chunks are derived deterministically: the same text and policy always
/// produce the same chunk boundaries.
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between consecutive chunks
    overlap: usize,
    /// Minimum chunk size (smaller chunks are dropped)
    min_size: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize, min_size: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            min_size,
        }
    }

    /// Chunk a document's extracted text
    pub fn chunk_document(&self, doc: &Document, text: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let sentences: Vec<&str> = text.split_sentence_bounds().collect();

        let mut current = String::new();
        let mut current_start = 0usize;
        let mut char_pos = 0usize;
        let mut chunk_index = 0u32;

        for sentence in sentences {
            let sentence_len = sentence.len();

            if !current.is_empty() && current.len() + sentence_len > self.chunk_size {
                if current.trim().len() >= self.min_size {
                    chunks.push(Chunk::new(
                        doc.id,
                        doc.filename.clone(),
                        current.trim().to_string(),
                        chunk_index,
                        current_start,
                        char_pos,
                    ));
                    chunk_index += 1;
                }

                // Carry the tail of the previous chunk into the next one
                let overlap_text = self.overlap_tail(&current);
                current = overlap_text;
                current_start = char_pos.saturating_sub(self.overlap);
            }

            current.push_str(sentence);
            char_pos += sentence_len;
        }

        if current.trim().len() >= self.min_size || (chunks.is_empty() && !current.trim().is_empty())
        {
            chunks.push(Chunk::new(
                doc.id,
                doc.filename.clone(),
                current.trim().to_string(),
                chunk_index,
                current_start,
                char_pos,
            ));
        }

        chunks
    }

    /// Take the last `overlap` characters of a chunk, preferring a word boundary
    fn overlap_tail(&self, text: &str) -> String {
        if text.len() <= self.overlap {
            return text.to_string();
        }

        let mut start = text.len().saturating_sub(self.overlap);
        while start > 0 && !text.is_char_boundary(start) {
            start -= 1;
        }

        let tail = &text[start..];
        if let Some(pos) = tail.find(' ') {
            return tail[pos + 1..].to_string();
        }
        tail.to_string()
    }
}
