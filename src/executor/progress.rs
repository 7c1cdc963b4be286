//! Progress tracking for export and import runs
//!
//! This module provides progress bar and statistics tracking for long-running
//! transfers, giving users real-time feedback on how many documents moved.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress tracker for document transfers
///
/// Tracks document processing progress and displays a progress bar
/// with statistics like speed and ETA. Without a known total it falls
/// back to a spinner with a running count.
pub struct ProgressTracker {
    /// Number of documents processed so far
    processed: AtomicU64,
    /// Start time of the operation
    start_time: Instant,
    /// Progress bar (optional, can be disabled)
    bar: Option<ProgressBar>,
}

impl ProgressTracker {
    /// Create a new progress tracker
    ///
    /// # Arguments
    /// * `total` - Total number of documents if known (None for unknown)
    /// * `enable_bar` - Whether to display a progress bar
    ///
    /// # Returns
    /// * `Self` - New progress tracker instance
    pub fn new(total: Option<u64>, enable_bar: bool) -> Self {
        let bar = enable_bar.then(|| match total {
            Some(n) => {
                let bar = ProgressBar::new(n);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                {
                    bar.set_style(style.progress_chars("#>-"));
                }
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                if let Ok(style) =
                    ProgressStyle::default_spinner().template("{spinner:.green} {pos} documents {msg}")
                {
                    bar.set_style(style);
                }
                bar
            }
        });

        Self {
            processed: AtomicU64::new(0),
            start_time: Instant::now(),
            bar,
        }
    }

    /// Advance progress by `delta` documents
    pub fn inc(&self, delta: u64) {
        let count = self.processed.fetch_add(delta, Ordering::Relaxed) + delta;
        self.show(count);
    }

    /// Documents processed so far
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Print a line above the bar without garbling it
    pub fn println(&self, line: &str) {
        match self.bar {
            Some(ref bar) => bar.println(line),
            None => eprintln!("{}", line),
        }
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }

    fn show(&self, count: u64) {
        if let Some(ref bar) = self.bar {
            bar.set_position(count);

            // Calculate and display speed
            let elapsed = self.start_time.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                let speed = count as f64 / elapsed;
                bar.set_message(format!("({:.0} docs/sec)", speed));
            }
        }
    }
}
