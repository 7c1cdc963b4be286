//! Error handling for export and import runs.
//!
//! This module provides:
//! - The error taxonomy shared by both pipelines ([`PorterError`])
//! - Structured extraction of search service error bodies
//! - Mapping of HTTP statuses onto fatal and non-fatal errors
//!
//! # Example
//!
//! ```rust,no_run
//! use search_porter::error::{classify_response, RequestKind, Result};
//!
//! fn check(status: u16, body: &str) -> Result<()> {
//!     if status >= 400 {
//!         return Err(classify_response(status, body, RequestKind::Query));
//!     }
//!     Ok(())
//! }
//! ```

pub mod kinds;
pub mod service;

// Re-export commonly used types
pub use kinds::{
    AuthError, ConfigError, FormatError, PorterError, QueryError, Result, ServiceError,
};
pub use service::{ErrorDetail, ErrorInfo, RequestKind, classify_response};
