//! Run result types
//!
//! This module defines what the two pipelines hand back to the caller:
//! - ExportResult: documents written and where
//! - ImportReport: per-run success and failure counts
//! - DocumentFailure: one rejected document and why

use std::path::PathBuf;

/// Result of an export operation
#[derive(Debug, Clone)]
pub struct ExportResult {
    /// Number of documents exported
    pub documents_exported: u64,
    /// File the documents were written to
    pub path: PathBuf,
    /// File size in bytes
    pub file_size_bytes: u64,
    /// Time taken for export
    pub elapsed_ms: u64,
}

/// One document the service did not accept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFailure {
    /// 1-based batch number
    pub batch: usize,
    /// Document key, empty when unknown
    pub key: String,
    /// Per-document status, or the batch status for a rejected batch
    pub status_code: u16,
    /// Reason reported by the service
    pub message: String,
}

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    /// Documents read from the input file
    pub total: u64,
    /// Documents the service accepted
    pub succeeded: u64,
    /// Documents rejected individually or as part of a rejected batch
    pub failed: u64,
    /// Batches sent to the service
    pub batches_submitted: usize,
    /// Details for every failed document
    pub failures: Vec<DocumentFailure>,
    /// Whether the run stopped early on Ctrl+C
    pub cancelled: bool,
    /// Whether a fatal error stopped the run
    pub aborted: bool,
    /// Time taken for import
    pub elapsed_ms: u64,
}

impl ImportReport {
    /// Report for `total` documents before any batch was sent
    pub fn new(total: u64) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Every document was accepted and the run was not interrupted
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && !self.cancelled && !self.aborted && self.succeeded == self.total
    }

    /// Documents never submitted because the run stopped early
    pub fn skipped(&self) -> u64 {
        self.total.saturating_sub(self.succeeded + self.failed)
    }
}
