//! Import pipeline: JSON file to index
//!
//! The input file is read and validated completely, split into batches and
//! submitted batch by batch through the [`ImportCoordinator`].

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::Result;
use crate::executor::progress::ProgressTracker;
use crate::executor::result::ImportReport;
use crate::search::{DocumentCollection, IndexAction};

pub mod batch;
pub mod coordinator;
pub mod reader;

pub use batch::partition;
pub use coordinator::ImportCoordinator;
pub use reader::{parse_documents, read_documents};

/// Default number of documents per index request
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Everything an import run needs besides the collection
#[derive(Debug, Clone)]
pub struct ImportRequest {
    /// File holding a JSON array of documents
    pub input: PathBuf,
    /// Maximum documents per request
    pub batch_size: usize,
    /// Write mode
    pub action: IndexAction,
    /// Show a progress bar
    pub show_progress: bool,
}

impl ImportRequest {
    /// Replace-mode request with the default batch size
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            action: IndexAction::Upload,
            show_progress: true,
        }
    }
}

/// Import every document of `request.input` into `collection`
///
/// A malformed file or a zero batch size fails before any request is made.
///
/// # Returns
/// * `Result<ImportReport>` - Per-document counts or the fatal error
pub async fn import_from_file(
    collection: &dyn DocumentCollection,
    request: ImportRequest,
    cancel: Option<CancellationToken>,
) -> Result<ImportReport> {
    partition(0, request.batch_size)?;

    let docs = read_documents(&request.input).await?;
    info!(
        "Read {} documents from {}",
        docs.len(),
        request.input.display()
    );

    let tracker = ProgressTracker::new(Some(docs.len() as u64), request.show_progress);
    if request.show_progress && !docs.is_empty() {
        tracker.println(&format!(
            "Found {} documents to import into index '{}'",
            docs.len(),
            collection.name()
        ));
    }
    let mut coordinator = ImportCoordinator::new(
        collection,
        docs,
        request.batch_size,
        request.action,
        tracker,
    );
    if let Some(token) = cancel {
        coordinator = coordinator.with_cancellation(token);
    }
    coordinator.execute().await
}
