//! JSON array writer for export operations
//!
//! Documents are held in memory and written as one top-level JSON array when
//! the export finishes, so the file on disk is either absent or complete.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;
use crate::search::Document;

use super::{FormatWriter, validate_path};

/// Writer producing a single JSON array file
pub struct JsonArrayWriter {
    /// Path to the output file
    path: PathBuf,
    /// Documents collected so far
    docs: Vec<Document>,
    /// Indent with two spaces
    pretty: bool,
    /// Whether finalize already wrote the file
    finalized: bool,
}

impl JsonArrayWriter {
    /// Create a new JSON array writer
    ///
    /// # Arguments
    /// * `path` - Output file path, overwritten on finalize
    /// * `pretty` - Indent the output
    ///
    /// # Returns
    /// * `Result<Self>` - New writer or I/O error if the path is unusable
    pub fn new(path: &Path, pretty: bool) -> Result<Self> {
        validate_path(path)?;
        debug!("Created JSON array writer for: {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            docs: Vec::new(),
            pretty,
            finalized: false,
        })
    }

    /// Serialize the collected documents
    fn render(&self) -> Result<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(&self.docs)
        } else {
            serde_json::to_vec(&self.docs)
        };
        bytes.map_err(|e| format!("Failed to serialize documents: {}", e).into())
    }
}

#[async_trait]
impl FormatWriter for JsonArrayWriter {
    async fn write_batch(&mut self, docs: Vec<Document>) -> Result<usize> {
        let count = docs.len();
        self.docs.extend(docs);
        debug!("Buffered {} documents (total: {})", count, self.docs.len());
        Ok(count)
    }

    async fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Ok(());
        }

        let mut bytes = self.render()?;
        bytes.push(b'\n');
        tokio::fs::write(&self.path, &bytes).await?;
        self.finalized = true;

        debug!(
            "Finalized JSON file: {} ({} documents, {} bytes)",
            self.path.display(),
            self.docs.len(),
            bytes.len()
        );
        Ok(())
    }

    async fn file_size(&self) -> Result<u64> {
        let metadata = tokio::fs::metadata(&self.path).await?;
        Ok(metadata.len())
    }
}
