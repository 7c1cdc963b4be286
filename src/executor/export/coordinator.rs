//! Export coordinator for orchestrating export operations
//!
//! This module provides the main coordinator that brings together the paged
//! query, progress tracking, and the JSON writer.

use std::path::PathBuf;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{PorterError, Result};
use crate::executor::cancelled;
use crate::executor::progress::ProgressTracker;
use crate::executor::result::ExportResult;

use super::streaming::StreamingQuery;
use super::writers::FormatWriter;

/// Coordinator for export operations
///
/// Drains the streaming query into the format writer while advancing the
/// progress tracker once per document.
pub struct ExportCoordinator<'a> {
    /// Streaming query for fetching documents
    query: Box<dyn StreamingQuery + 'a>,
    /// Progress tracker for user feedback
    tracker: ProgressTracker,
    /// Format writer for output
    writer: Box<dyn FormatWriter + 'a>,
    /// Output path, reported back in the result
    path: PathBuf,
    /// Cancellation token for aborting export
    cancel_token: Option<CancellationToken>,
}

impl<'a> ExportCoordinator<'a> {
    /// Create a new export coordinator
    pub fn new(
        query: Box<dyn StreamingQuery + 'a>,
        tracker: ProgressTracker,
        writer: Box<dyn FormatWriter + 'a>,
        path: PathBuf,
    ) -> Self {
        Self {
            query,
            tracker,
            writer,
            path,
            cancel_token: None,
        }
    }

    /// Set cancellation token for this export operation
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Execute the export operation
    ///
    /// 1. Pull pages until the query is exhausted or the cap is hit
    /// 2. Hand each page to the writer
    /// 3. Track progress
    /// 4. Write the file and return statistics
    ///
    /// Cancellation leaves any existing output file untouched.
    ///
    /// # Returns
    /// * `Result<ExportResult>` - Export statistics or error
    pub async fn execute(&mut self) -> Result<ExportResult> {
        let start_time = Instant::now();

        info!("Starting export operation");
        let mut exported = 0u64;
        let mut page_count = 0u32;

        let cancel = self.cancel_token.clone();

        loop {
            if cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
                return Err(self.stop_cancelled(exported).await);
            }

            debug!("Fetching page #{}", page_count + 1);

            // A stalled request must not outlive Ctrl+C
            let next = tokio::select! {
                next = self.query.next_batch() => Some(next),
                _ = cancelled(cancel.as_ref()) => None,
            };
            let next = match next {
                Some(Ok(next)) => next,
                Some(Err(e)) => {
                    self.tracker.finish();
                    return Err(e);
                }
                None => return Err(self.stop_cancelled(exported).await),
            };

            match next {
                Some(docs) => {
                    let count = match self.writer.write_batch(docs).await {
                        Ok(count) => count,
                        Err(e) => {
                            self.tracker.finish();
                            return Err(e);
                        }
                    };
                    exported += count as u64;
                    self.tracker.inc(count as u64);

                    page_count += 1;
                    if page_count % 10 == 0 {
                        info!(
                            "Progress: {} documents exported ({} pages)",
                            exported, page_count
                        );
                    }
                }
                None => {
                    debug!("No more documents available");
                    break;
                }
            }
        }

        self.query.close().await?;
        self.tracker.finish();

        debug!("Writing output file");
        self.writer.finalize().await?;

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        let file_size_bytes = self.writer.file_size().await?;

        info!(
            "Export completed: {} documents, {} bytes, {} ms",
            exported, file_size_bytes, elapsed_ms
        );

        Ok(ExportResult {
            documents_exported: exported,
            path: self.path.clone(),
            file_size_bytes,
            elapsed_ms,
        })
    }

    /// Release the query and clear the bar after Ctrl+C
    async fn stop_cancelled(&mut self, exported: u64) -> PorterError {
        info!("Export operation cancelled by user after {} documents", exported);
        if let Err(e) = self.query.close().await {
            warn!("Failed to close query: {}", e);
        }
        self.tracker.finish();
        PorterError::Cancelled
    }
}
