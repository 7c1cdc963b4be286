//! Transfer execution engine
//!
//! This module provides the two pipelines that move documents between a
//! JSON file and a search index:
//! - Export: paged reads into a single JSON array file
//! - Import: batched writes from a JSON array file
//! - Progress tracking shared by both
//! - Result types consumed by the formatter

pub mod export;
pub mod import;
pub mod progress;
pub mod result;

pub use export::{ExportRequest, export_to_file};
pub use import::{ImportRequest, import_from_file};
pub use progress::ProgressTracker;
pub use result::{DocumentFailure, ExportResult, ImportReport};

use tokio_util::sync::CancellationToken;

/// Resolves once `token` is cancelled; never resolves without a token
pub(crate) async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}
