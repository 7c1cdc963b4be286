//! Import coordinator for orchestrating batch submission
//!
//! Batches go out one after another. Documents the service rejects are
//! collected into the report; a batch the service rejects as a whole counts
//! every one of its documents as failed. A fatal error stops the run and
//! hands back the partial report inside [`PorterError::ImportAborted`].

use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{PorterError, Result};
use crate::executor::cancelled;
use crate::executor::progress::ProgressTracker;
use crate::executor::result::{DocumentFailure, ImportReport};
use crate::search::{Document, DocumentCollection, IndexAction, IndexingOutcome};

use super::batch::partition;

/// Coordinator for import operations
pub struct ImportCoordinator<'a> {
    /// Target collection
    collection: &'a dyn DocumentCollection,
    /// Documents in file order
    docs: Vec<Document>,
    /// Maximum documents per request
    batch_size: usize,
    /// Write mode for every batch
    action: IndexAction,
    /// Progress tracker for user feedback
    tracker: ProgressTracker,
    /// Cancellation token checked between batches
    cancel_token: Option<CancellationToken>,
}

impl<'a> ImportCoordinator<'a> {
    /// Create a new import coordinator
    ///
    /// # Arguments
    /// * `collection` - Collection to write to
    /// * `docs` - Documents to submit, in order
    /// * `batch_size` - Maximum documents per request
    /// * `action` - Upload, merge or merge-or-upload
    /// * `tracker` - Progress display, advanced per batch
    pub fn new(
        collection: &'a dyn DocumentCollection,
        docs: Vec<Document>,
        batch_size: usize,
        action: IndexAction,
        tracker: ProgressTracker,
    ) -> Self {
        Self {
            collection,
            docs,
            batch_size,
            action,
            tracker,
            cancel_token: None,
        }
    }

    /// Set cancellation token for this import operation
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Execute the import operation
    ///
    /// # Returns
    /// * `Result<ImportReport>` - Per-document counts, or
    ///   [`PorterError::ImportAborted`] with the counts so far
    pub async fn execute(&mut self) -> Result<ImportReport> {
        let start_time = Instant::now();
        let batches = partition(self.docs.len(), self.batch_size)?;
        let mut report = ImportReport::new(self.docs.len() as u64);

        info!(
            "Starting import of {} documents in {} batches ({})",
            self.docs.len(),
            batches.len(),
            self.action.as_str()
        );

        let cancel = self.cancel_token.clone();

        for (i, range) in batches.into_iter().enumerate() {
            let number = i + 1;

            if cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
                info!("Import cancelled by user before batch #{}", number);
                report.cancelled = true;
                break;
            }

            let batch = &self.docs[range];
            debug!("Submitting batch #{} ({} documents)", number, batch.len());

            let result = tokio::select! {
                result = self.collection.index_batch(batch, self.action) => Some(result),
                _ = cancelled(cancel.as_ref()) => None,
            };
            report.batches_submitted += 1;

            let Some(result) = result else {
                // The service may still apply the batch; its documents stay unaccounted
                info!("Import cancelled by user during batch #{}", number);
                report.cancelled = true;
                break;
            };

            match result {
                Ok(outcomes) => record_outcomes(&mut report, number, batch.len(), outcomes),
                Err(e) if !e.is_fatal() => {
                    warn!("Batch #{} rejected: {}", number, e);
                    let (status_code, message) = batch_failure(&e);
                    report.failed += batch.len() as u64;
                    report.failures.extend(batch.iter().map(|_| DocumentFailure {
                        batch: number,
                        key: String::new(),
                        status_code,
                        message: message.clone(),
                    }));
                }
                Err(e) => {
                    self.tracker.finish();
                    warn!(
                        "Import aborted at batch #{} after {} documents: {}",
                        number, report.succeeded, e
                    );
                    report.aborted = true;
                    report.elapsed_ms = start_time.elapsed().as_millis() as u64;
                    return Err(PorterError::ImportAborted {
                        report: Box::new(report),
                        cause: Box::new(e),
                    });
                }
            }

            self.tracker.inc(batch.len() as u64);
        }

        self.tracker.finish();
        report.elapsed_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Import completed: {} succeeded, {} failed, {} batches, {} ms",
            report.succeeded, report.failed, report.batches_submitted, report.elapsed_ms
        );
        Ok(report)
    }
}

fn record_outcomes(
    report: &mut ImportReport,
    batch: usize,
    submitted: usize,
    outcomes: Vec<IndexingOutcome>,
) {
    let reported = outcomes.len();
    for outcome in outcomes {
        if outcome.succeeded {
            report.succeeded += 1;
            continue;
        }
        warn!(
            "Document '{}' failed ({}): {}",
            outcome.key,
            outcome.status_code,
            outcome.error_message.as_deref().unwrap_or("no message")
        );
        report.failed += 1;
        report.failures.push(DocumentFailure {
            batch,
            key: outcome.key,
            status_code: outcome.status_code,
            message: outcome.error_message.unwrap_or_default(),
        });
    }

    // Documents the service did not report on are not known to be written
    if reported < submitted {
        let missing = submitted - reported;
        warn!("Batch #{}: no status for {} documents", batch, missing);
        report.failed += missing as u64;
        report.failures.extend((0..missing).map(|_| DocumentFailure {
            batch,
            key: String::new(),
            status_code: 0,
            message: "no status reported".to_string(),
        }));
    }
}

/// Status and message recorded for each document of a rejected batch
fn batch_failure(error: &PorterError) -> (u16, String) {
    match error {
        PorterError::Service(e) => (e.status, e.message()),
        other => (0, other.to_string()),
    }
}
