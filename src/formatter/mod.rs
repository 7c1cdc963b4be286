//! Output formatting for transfer results
//!
//! This module turns pipeline results into the lines printed at the end of
//! a run:
//! - Export summary with file size and duration
//! - Import summary with success and failure counts
//! - Failure table for documents the service rejected

pub mod table;

pub use table::FailureTable;

use crate::executor::{ExportResult, ImportReport};

/// Formatter for end-of-run summaries
pub struct SummaryFormatter {
    /// Include size and timing details
    verbose: bool,

    /// Table used for rejected documents
    failures: FailureTable,
}

impl SummaryFormatter {
    /// Create a new summary formatter
    ///
    /// # Arguments
    /// * `verbose` - Add file size and elapsed time to the summary
    ///
    /// # Returns
    /// * `Self` - New formatter
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            failures: FailureTable::new(),
        }
    }

    /// Replace the failure table settings
    pub fn with_failure_table(mut self, table: FailureTable) -> Self {
        self.failures = table;
        self
    }

    /// Format the result of an export
    ///
    /// # Arguments
    /// * `result` - Export statistics
    ///
    /// # Returns
    /// * `String` - Summary line
    pub fn format_export(&self, result: &ExportResult) -> String {
        let mut line = format!(
            "Successfully exported {} documents to {}",
            result.documents_exported,
            result.path.display()
        );
        if self.verbose {
            line.push_str(&format!(
                " ({}, {})",
                format_bytes(result.file_size_bytes),
                format_elapsed(result.elapsed_ms)
            ));
        }
        line
    }

    /// Format the report of an import
    ///
    /// # Arguments
    /// * `report` - Import counts and failures
    ///
    /// # Returns
    /// * `String` - Summary lines, with the failure table when any document failed
    pub fn format_import(&self, report: &ImportReport) -> String {
        if report.total == 0 {
            return "No documents found in the input file.".to_string();
        }

        let mut lines = Vec::new();

        if report.cancelled {
            lines.push(format!(
                "Import interrupted. {} documents were not submitted.",
                report.skipped()
            ));
        } else if report.aborted {
            lines.push(format!(
                "Import aborted. {} documents were not submitted.",
                report.skipped()
            ));
        }

        let mut complete = if report.aborted {
            format!("Successfully imported {} documents.", report.succeeded)
        } else {
            format!(
                "Import complete. Successfully imported {} documents.",
                report.succeeded
            )
        };
        if self.verbose {
            complete.push_str(&format!(
                " ({} batches, {})",
                report.batches_submitted,
                format_elapsed(report.elapsed_ms)
            ));
        }
        lines.push(complete);

        if report.failed > 0 {
            lines.push(format!("Failed to import {} documents.", report.failed));
            lines.push(self.failures.format(&report.failures));
        }

        lines.join("\n")
    }
}

impl Default for SummaryFormatter {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Human-readable byte count
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

/// Human-readable duration
fn format_elapsed(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else {
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::DocumentFailure;
    use std::path::PathBuf;

    #[test]
    fn test_export_summary() {
        let result = ExportResult {
            documents_exported: 42,
            path: PathBuf::from("hotels.json"),
            file_size_bytes: 2048,
            elapsed_ms: 1500,
        };

        assert_eq!(
            SummaryFormatter::new(false).format_export(&result),
            "Successfully exported 42 documents to hotels.json"
        );
        assert_eq!(
            SummaryFormatter::new(true).format_export(&result),
            "Successfully exported 42 documents to hotels.json (2.0 KB, 1.5s)"
        );
    }

    #[test]
    fn test_clean_import_summary() {
        let report = ImportReport {
            total: 10,
            succeeded: 10,
            batches_submitted: 1,
            ..Default::default()
        };
        assert_eq!(
            SummaryFormatter::default().format_import(&report),
            "Import complete. Successfully imported 10 documents."
        );
    }

    #[test]
    fn test_import_summary_with_failures() {
        let report = ImportReport {
            total: 3,
            succeeded: 2,
            failed: 1,
            batches_submitted: 1,
            failures: vec![DocumentFailure {
                batch: 1,
                key: "doc-3".to_string(),
                status_code: 404,
                message: "Document not found.".to_string(),
            }],
            ..Default::default()
        };

        let output = SummaryFormatter::default().format_import(&report);
        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some("Import complete. Successfully imported 2 documents.")
        );
        assert_eq!(lines.next(), Some("Failed to import 1 documents."));
        assert!(output.contains("doc-3"));
    }

    #[test]
    fn test_empty_import_summary() {
        assert_eq!(
            SummaryFormatter::default().format_import(&ImportReport::new(0)),
            "No documents found in the input file."
        );
    }

    #[test]
    fn test_cancelled_import_summary() {
        let report = ImportReport {
            total: 10,
            succeeded: 4,
            cancelled: true,
            ..Default::default()
        };
        let output = SummaryFormatter::default().format_import(&report);
        assert!(output.starts_with("Import interrupted. 6 documents were not submitted."));
    }

    #[test]
    fn test_aborted_import_summary() {
        let report = ImportReport {
            total: 30,
            succeeded: 10,
            batches_submitted: 2,
            aborted: true,
            ..Default::default()
        };
        let output = SummaryFormatter::default().format_import(&report);
        assert_eq!(
            output,
            "Import aborted. 20 documents were not submitted.\nSuccessfully imported 10 documents."
        );
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
