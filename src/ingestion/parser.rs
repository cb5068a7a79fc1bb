//! File parsing: text extraction and content hashing

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::types::FileType;

/// Parsed document with extracted text and metadata
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// File type
    pub file_type: FileType,
    /// Extracted text content
    pub content: String,
    /// Content hash (sha256, hex) of the raw bytes
    pub content_hash: String,
}

/// Multi-format file parser
pub struct FileParser;

impl FileParser {
    /// Parse raw file bytes into text
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let file_type = FileType::from_filename(filename);

        let content = match &file_type {
            FileType::Txt | FileType::Markdown => Self::parse_text(filename, data)?,
            FileType::Pdf => Self::parse_pdf(filename, data)?,
            FileType::Unknown => {
                let ext = std::path::Path::new(filename)
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("(none)");
                return Err(Error::UnsupportedFileType(ext.to_string()));
            }
        };

        if content.trim().is_empty() {
            return Err(Error::parse(filename, "No text content extracted"));
        }

        Ok(ParsedDocument {
            file_type,
            content,
            content_hash: Self::content_hash(data),
        })
    }

    /// Compute the sha256 hash of the raw bytes
    pub fn content_hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    fn parse_text(filename: &str, data: &[u8]) -> Result<String> {
        String::from_utf8(data.to_vec())
            .map_err(|e| Error::parse(filename, format!("Invalid UTF-8: {}", e)))
    }

    fn parse_pdf(filename: &str, data: &[u8]) -> Result<String> {
        pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::parse(filename, format!("PDF extraction failed: {}", e)))
    }
}
