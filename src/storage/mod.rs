//! Filesystem document store for raw uploads

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Stores uploaded files on disk, one file per upload, named by the original
/// filename. A second upload with the same name overwrites the first.
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    /// Create the store, ensuring the directory exists
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Write the raw bytes of an upload, returning the path written.
    ///
    /// The filename is reduced to its final path component so a crafted
    /// filename cannot escape the store directory.
    pub async fn store(&self, filename: &str, data: &[u8]) -> Result<PathBuf> {
        let name = Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.bin".to_string());
        let path = self.dir.join(name);
        tokio::fs::write(&path, data).await?;
        Ok(path)
    }

    /// Read a stored file back
    pub async fn read(&self, filename: &str) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.dir.join(filename)).await?)
    }

    /// True if a file with this name has been stored
    pub fn contains(&self, filename: &str) -> bool {
        self.dir.join(filename).exists()
    }
}
