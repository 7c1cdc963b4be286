//! Search index collaborator
//!
//! Everything the export and import pipelines need from the remote index sits
//! behind [`DocumentCollection`]:
//!
//! - `count`: number of documents matching a filter
//! - `search_page`: one page of documents for a query
//! - `index_batch`: write a batch with a given [`IndexAction`]
//!
//! [`SearchClient`] implements it against the REST API, [`InMemoryCollection`]
//! keeps documents in memory so the pipelines can run without a live service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

pub mod client;
pub mod memory;

pub use client::SearchClient;
pub use memory::InMemoryCollection;

/// A single index document: field name to JSON value, in field order.
pub type Document = Map<String, Value>;

/// Prefix of the per-hit annotations the service adds to search results.
pub const ANNOTATION_PREFIX: &str = "@search.";

/// What to read during an export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportQuery {
    /// Fields to keep; empty means all retrievable fields.
    pub select: Vec<String>,

    /// Filter expression in the service's query language.
    pub filter: Option<String>,

    /// Maximum number of documents to export.
    pub top: Option<usize>,

    /// Sort expression used to keep paging stable.
    pub order_by: Option<String>,
}

/// One page request sent to the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub select: Vec<String>,
    pub filter: Option<String>,
    pub order_by: Option<String>,
    pub top: usize,
    pub skip: usize,
}

impl ExportQuery {
    /// Build the request for the page starting at `skip`.
    pub fn page(&self, skip: usize, top: usize) -> SearchRequest {
        SearchRequest {
            select: self.select.clone(),
            filter: self.filter.clone(),
            order_by: self.order_by.clone(),
            top,
            skip,
        }
    }
}

/// Write mode applied to every document of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndexAction {
    /// Create or fully replace the stored document.
    Upload,
    /// Update the given fields of an existing document.
    Merge,
    /// Merge into an existing document or create it.
    MergeOrUpload,
}

impl IndexAction {
    /// Value of the `@search.action` annotation.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexAction::Upload => "upload",
            IndexAction::Merge => "merge",
            IndexAction::MergeOrUpload => "mergeOrUpload",
        }
    }
}

/// Outcome of one document inside an index batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingOutcome {
    /// Document key as reported by the service.
    pub key: String,

    /// Whether the document was written.
    #[serde(rename = "status")]
    pub succeeded: bool,

    /// HTTP-style status for this document (200, 201, 404, ...).
    pub status_code: u16,

    /// Reason for the failure, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl IndexingOutcome {
    /// Successful outcome for `key`.
    pub fn ok(key: impl Into<String>, status_code: u16) -> Self {
        Self {
            key: key.into(),
            succeeded: true,
            status_code,
            error_message: None,
        }
    }

    /// Failed outcome for `key`.
    pub fn failed(key: impl Into<String>, status_code: u16, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            succeeded: false,
            status_code,
            error_message: Some(message.into()),
        }
    }
}

/// A remote collection of documents.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Name of the collection, used in log and report messages.
    fn name(&self) -> &str;

    /// Count documents matching `filter`, if the service reports counts.
    async fn count(&self, filter: Option<&str>) -> Result<Option<u64>>;

    /// Fetch one page of matching documents.
    async fn search_page(&self, request: &SearchRequest) -> Result<Vec<Document>>;

    /// Submit one batch and return the per-document outcomes.
    async fn index_batch(
        &self,
        batch: &[Document],
        action: IndexAction,
    ) -> Result<Vec<IndexingOutcome>>;

    /// Create or fully replace every document of the batch.
    async fn upload(&self, batch: &[Document]) -> Result<Vec<IndexingOutcome>> {
        self.index_batch(batch, IndexAction::Upload).await
    }

    /// Update only the given fields of existing documents.
    async fn merge(&self, batch: &[Document]) -> Result<Vec<IndexingOutcome>> {
        self.index_batch(batch, IndexAction::Merge).await
    }
}

/// Remove the `@search.*` annotations from a search hit.
pub fn strip_annotations(mut doc: Document) -> Document {
    doc.retain(|key, _| !key.starts_with(ANNOTATION_PREFIX));
    doc
}
