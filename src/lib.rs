//! Search Porter Library
//!
//! This library moves documents between JSON array files and Azure AI
//! Search indexes. It can be used without the binary, e.g. to script
//! migrations between indexes.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `connection`: Service endpoint, index and credential
//! - `error`: Error types and service error mapping
//! - `executor`: Export and import pipelines
//! - `formatter`: Run summaries and failure tables
//! - `search`: Document collection interface, REST client and in-memory collection
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use search_porter::connection::ConnectionDescriptor;
//! use search_porter::executor::{ExportRequest, export_to_file};
//! use search_porter::search::{ExportQuery, SearchClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let conn = ConnectionDescriptor::for_service("contoso", "hotels", "<key>", "2023-11-01")?;
//!     let client = SearchClient::new(conn, Duration::from_secs(30))?;
//!
//!     let request = ExportRequest::new(ExportQuery::default(), "hotels.json");
//!     let result = export_to_file(&client, request, None).await?;
//!     println!("Exported {} documents", result.documents_exported);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod formatter;
pub mod search;

// Re-export commonly used types
pub use config::Config;
pub use connection::ConnectionDescriptor;
pub use error::{PorterError, Result};
pub use executor::{ExportResult, ImportReport};
pub use formatter::SummaryFormatter;
pub use search::{DocumentCollection, InMemoryCollection, SearchClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}
