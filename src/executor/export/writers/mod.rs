//! Format writers for export operations
//!
//! This module provides the interface the coordinator writes through and the
//! JSON array writer that produces the export file.

use async_trait::async_trait;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use crate::error::Result;
use crate::search::Document;

pub mod json;

pub use json::JsonArrayWriter;

/// Trait for writing exported documents
#[async_trait]
pub trait FormatWriter: Send {
    /// Write a batch of documents
    ///
    /// # Arguments
    /// * `docs` - Documents to write, in order
    ///
    /// # Returns
    /// * `Result<usize>` - Number of documents accepted
    async fn write_batch(&mut self, docs: Vec<Document>) -> Result<usize>;

    /// Finalize the output (serialize, flush, close)
    ///
    /// # Returns
    /// * `Result<()>` - Success or error
    async fn finalize(&mut self) -> Result<()>;

    /// Get the current file size in bytes (if applicable)
    ///
    /// # Returns
    /// * `Result<u64>` - File size in bytes
    async fn file_size(&self) -> Result<u64>;
}

/// Check that the output file can be created before any work starts
///
/// # Arguments
/// * `path` - File path to validate
///
/// # Returns
/// * `Result<()>` - Success or I/O error
pub(crate) fn validate_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is a directory", path.display()),
        )
        .into());
    }

    // Check if parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Directory does not exist: {}", parent.display()),
            )
            .into());
        }
    }

    let existed = path.exists();
    if existed && path.metadata().is_ok_and(|m| m.permissions().readonly()) {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("{} is read-only", path.display()),
        )
        .into());
    }

    // Opening without truncation leaves an existing file untouched until finalize
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| io::Error::new(e.kind(), format!("Cannot create {}: {}", path.display(), e)))?;
    if !existed {
        fs::remove_file(path)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path_missing_directory() {
        let result = validate_path(Path::new("/nonexistent/directory/out.json"));
        assert!(matches!(result, Err(crate::error::PorterError::Io(_))));
    }

    #[test]
    fn test_validate_path_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_path(dir.path()).is_err());
        assert!(validate_path(&dir.path().join("out.json")).is_ok());
    }

    #[test]
    fn test_validate_path_leaves_no_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        validate_path(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_validate_path_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        std::fs::write(&path, "[1]").unwrap();

        validate_path(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1]");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_validate_path_uncreatable_file() {
        // procfs refuses new files even for root
        let result = validate_path(Path::new("/proc/search-porter-out.json"));
        assert!(matches!(result, Err(crate::error::PorterError::Io(_))));
    }
}
