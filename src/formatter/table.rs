//! Table formatting for failed documents using tabled

use tabled::{
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Rows},
};

use crate::executor::DocumentFailure;

/// Maximum rows shown before the table is cut off
pub const DEFAULT_MAX_ROWS: usize = 20;

/// Maximum characters of a failure message (characters)
const DEFAULT_MAX_MESSAGE_WIDTH: usize = 60;

/// Table formatter for per-document failures
pub struct FailureTable {
    /// Rows shown before "... and N more"
    max_rows: usize,

    /// Message column width
    max_message_width: usize,
}

impl FailureTable {
    /// Create a failure table with default limits
    pub fn new() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            max_message_width: DEFAULT_MAX_MESSAGE_WIDTH,
        }
    }

    /// Set the number of rows shown
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Render `failures` as a table
    ///
    /// # Arguments
    /// * `failures` - Failed documents in submission order
    ///
    /// # Returns
    /// * `String` - Table, followed by a line counting the rows left out
    pub fn format(&self, failures: &[DocumentFailure]) -> String {
        if failures.is_empty() {
            return String::new();
        }

        let mut builder = Builder::default();
        builder.push_record(["Batch", "Key", "Status", "Message"]);

        for failure in failures.iter().take(self.max_rows) {
            builder.push_record([
                failure.batch.to_string(),
                display_key(&failure.key),
                display_status(failure.status_code),
                truncate(&failure.message, self.max_message_width),
            ]);
        }

        let mut table = builder.build();
        table.with(Style::modern());
        table.with(Modify::new(Rows::first()).with(Alignment::center()));

        let mut output = table.to_string();
        if failures.len() > self.max_rows {
            output.push_str(&format!("\n... and {} more", failures.len() - self.max_rows));
        }
        output
    }
}

impl Default for FailureTable {
    fn default() -> Self {
        Self::new()
    }
}

fn display_key(key: &str) -> String {
    if key.is_empty() {
        "-".to_string()
    } else {
        key.to_string()
    }
}

fn display_status(status: u16) -> String {
    if status == 0 {
        "-".to_string()
    } else {
        status.to_string()
    }
}

/// Cut `text` to `max` characters, marking the cut with "..."
fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(batch: usize, key: &str, message: &str) -> DocumentFailure {
        DocumentFailure {
            batch,
            key: key.to_string(),
            status_code: 404,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_table_lists_failures() {
        let output = FailureTable::new().format(&[
            failure(1, "doc-7", "Document not found."),
            failure(3, "", "Service Unavailable"),
        ]);

        assert!(output.contains("Batch"));
        assert!(output.contains("doc-7"));
        assert!(output.contains("Document not found."));
        assert!(output.contains("Service Unavailable"));
        assert!(!output.contains("more"));
    }

    #[test]
    fn test_table_is_capped() {
        let failures: Vec<_> = (0..25).map(|i| failure(1, &format!("k{i}"), "x")).collect();
        let output = FailureTable::new().format(&failures);

        assert!(output.contains("k19"));
        assert!(!output.contains("k20"));
        assert!(output.ends_with("... and 5 more"));
    }

    #[test]
    fn test_empty_failures_render_nothing() {
        assert!(FailureTable::new().format(&[]).is_empty());
    }

    #[test]
    fn test_truncate_long_message() {
        let message = "é".repeat(100);
        let cut = truncate(&message, 10);
        assert_eq!(cut.chars().count(), 10);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate("short", 10), "short");
    }
}
