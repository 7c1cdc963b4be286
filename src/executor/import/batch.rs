//! Batch partitioning for import operations

use std::ops::Range;

use crate::error::{ConfigError, Result};

/// Split `len` documents into contiguous ranges of at most `batch_size`
///
/// Every range but the last holds exactly `batch_size` documents, and the
/// ranges cover `0..len` in order.
///
/// # Returns
/// * `Result<Vec<Range<usize>>>` - Batch ranges, or ConfigError for a zero batch size
pub fn partition(len: usize, batch_size: usize) -> Result<Vec<Range<usize>>> {
    if batch_size == 0 {
        return Err(ConfigError::InvalidValue {
            field: "batch_size".to_string(),
            value: "0".to_string(),
        }
        .into());
    }

    Ok((0..len)
        .step_by(batch_size)
        .map(|start| start..(start + batch_size).min(len))
        .collect())
}
