//! Export pipeline: index to JSON file
//!
//! The export is built on three components:
//!
//! 1. **PagedQuery**: pulls matching documents page by page
//! 2. **ProgressTracker**: real-time feedback while pages arrive
//! 3. **JsonArrayWriter**: writes the documents as one JSON array
//!
//! These are orchestrated by the **ExportCoordinator**. [`export_to_file`]
//! wires them up for a [`DocumentCollection`].
//!
//! # Example
//!
//! ```no_run
//! use search_porter::executor::export::{export_to_file, ExportRequest};
//! use search_porter::search::{ExportQuery, InMemoryCollection};
//!
//! # async fn demo() -> search_porter::Result<()> {
//! let collection = InMemoryCollection::new("hotels", "id");
//! let request = ExportRequest::new(ExportQuery::default(), "hotels.json");
//! let result = export_to_file(&collection, request, None).await?;
//! println!("{} documents", result.documents_exported);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MAX_PAGE_SIZE;
use crate::error::Result;
use crate::executor::progress::ProgressTracker;
use crate::executor::result::ExportResult;
use crate::search::{DocumentCollection, ExportQuery};

pub mod coordinator;
pub mod streaming;
pub mod writers;

pub use coordinator::ExportCoordinator;
pub use streaming::{PagedQuery, StreamingQuery};
pub use writers::{FormatWriter, JsonArrayWriter};

/// Everything an export run needs besides the collection
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// What to read
    pub query: ExportQuery,
    /// Where to write
    pub output: PathBuf,
    /// Documents per search request
    pub page_size: usize,
    /// Show a progress bar
    pub show_progress: bool,
    /// Indent the JSON output
    pub pretty: bool,
}

impl ExportRequest {
    /// Request with default paging, progress and formatting
    pub fn new(query: ExportQuery, output: impl Into<PathBuf>) -> Self {
        Self {
            query,
            output: output.into(),
            page_size: MAX_PAGE_SIZE,
            show_progress: true,
            pretty: true,
        }
    }
}

/// Export every matching document of `collection` into a JSON file
///
/// The output path is checked before any request is made. The matching
/// count sizes the progress bar, capped by `top`; when the service does not
/// report a count the bar runs as a spinner.
///
/// # Returns
/// * `Result<ExportResult>` - Export statistics or error
pub async fn export_to_file(
    collection: &dyn DocumentCollection,
    request: ExportRequest,
    cancel: Option<CancellationToken>,
) -> Result<ExportResult> {
    let writer = JsonArrayWriter::new(&request.output, request.pretty)?;

    let total = if request.show_progress {
        let count = match collection.count(request.query.filter.as_deref()).await {
            Ok(count) => count,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Could not count documents: {}", e);
                None
            }
        };
        match (count, request.query.top) {
            (Some(count), Some(top)) => Some(count.min(top as u64)),
            (count, _) => count,
        }
    } else {
        None
    };

    debug!("Exporting {} with {:?}", collection.name(), request.query);

    let query = collection.query(request.query, request.page_size);
    let tracker = ProgressTracker::new(total, request.show_progress);
    if let Some(n) = total {
        info!("Found {} documents in index '{}'", n, collection.name());
        tracker.println(&format!("Found {} documents in index '{}'", n, collection.name()));
    }

    let mut coordinator =
        ExportCoordinator::new(Box::new(query), tracker, Box::new(writer), request.output);
    if let Some(token) = cancel {
        coordinator = coordinator.with_cancellation(token);
    }
    coordinator.execute().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PorterError;
    use crate::search::{Document, InMemoryCollection};
    use serde_json::{Value, json};

    fn hotels(n: usize) -> InMemoryCollection {
        InMemoryCollection::new("hotels", "id")
            .with_documents((0..n).map(|i| {
                let Value::Object(doc) = json!({
                    "id": format!("{i:03}"),
                    "name": format!("Hotel {i}"),
                    "rating": i % 5,
                    "tags": ["pool", "view"],
                }) else {
                    unreachable!()
                };
                doc
            }))
            .with_filter("rating ge 4", |d| {
                d.get("rating").and_then(Value::as_u64) >= Some(4)
            })
    }

    fn request(query: ExportQuery, output: PathBuf) -> ExportRequest {
        ExportRequest {
            page_size: 7,
            show_progress: false,
            ..ExportRequest::new(query, output)
        }
    }

    async fn read(path: &std::path::Path) -> Vec<Document> {
        let content = tokio::fs::read_to_string(path).await.unwrap();
        serde_json::from_str(&content).unwrap()
    }

    #[tokio::test]
    async fn test_exports_everything_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("hotels.json");
        let collection = hotels(20);

        let result = export_to_file(&collection, request(ExportQuery::default(), out.clone()), None)
            .await
            .unwrap();

        assert_eq!(result.documents_exported, 20);
        assert_eq!(read(&out).await, collection.documents());
    }

    #[tokio::test]
    async fn test_select_projects_fields() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("hotels.json");
        let query = ExportQuery {
            select: vec!["id".to_string(), "name".to_string()],
            ..Default::default()
        };

        export_to_file(&hotels(10), request(query, out.clone()), None)
            .await
            .unwrap();

        for doc in read(&out).await {
            let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["id", "name"]);
        }
    }

    #[tokio::test]
    async fn test_top_caps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("hotels.json");
        let query = ExportQuery {
            top: Some(9),
            ..Default::default()
        };

        let result = export_to_file(&hotels(30), request(query, out.clone()), None)
            .await
            .unwrap();

        assert_eq!(result.documents_exported, 9);
        assert_eq!(read(&out).await.len(), 9);
    }

    #[tokio::test]
    async fn test_filter_restricts_documents() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("hotels.json");
        let query = ExportQuery {
            filter: Some("rating ge 4".to_string()),
            ..Default::default()
        };

        let mut req = request(query, out.clone());
        req.show_progress = true;
        let result = export_to_file(&hotels(20), req, None).await.unwrap();

        assert_eq!(result.documents_exported, 4);
    }

    #[tokio::test]
    async fn test_no_matches_writes_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("empty.json");

        export_to_file(&hotels(0), request(ExportQuery::default(), out.clone()), None)
            .await
            .unwrap();

        let content = tokio::fs::read_to_string(&out).await.unwrap();
        assert_eq!(content.trim(), "[]");
    }

    #[tokio::test]
    async fn test_rejected_filter_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("hotels.json");
        let query = ExportQuery {
            filter: Some("rating >> 4".to_string()),
            ..Default::default()
        };

        let err = export_to_file(&hotels(5), request(query, out.clone()), None)
            .await
            .unwrap_err();

        assert!(matches!(err, PorterError::Query(_)));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_bad_credentials_abort() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("hotels.json");
        let collection = hotels(5).rejecting_all(401);

        let err = export_to_file(&collection, request(ExportQuery::default(), out), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PorterError::Auth(_)));
    }

    #[tokio::test]
    async fn test_unwritable_output_fails_before_requests() {
        let collection = hotels(5);
        let out = PathBuf::from("/nonexistent/dir/hotels.json");

        let err = export_to_file(&collection, request(ExportQuery::default(), out), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PorterError::Io(_)));
        assert_eq!(collection.search_calls(), 0);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_uncreatable_output_fails_before_requests() {
        let collection = hotels(30);
        let out = PathBuf::from("/proc/search-porter-hotels.json");

        let err = export_to_file(&collection, request(ExportQuery::default(), out), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PorterError::Io(_)));
        assert_eq!(collection.search_calls(), 0);
    }

    #[tokio::test]
    async fn test_count_timeout_falls_back_to_spinner() {
        use crate::connection::ConnectionDescriptor;
        use crate::search::SearchClient;
        use std::time::Duration;
        use wiremock::matchers::{body_partial_json, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/indexes/hotels/docs/search"))
            .and(body_partial_json(json!({"count": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"@odata.count": 3, "value": []}))
                    .set_delay(Duration::from_secs(5)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/indexes/hotels/docs/search"))
            .and(body_partial_json(json!({"count": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"id": "1"}, {"id": "2"}, {"id": "3"}]
            })))
            .mount(&server)
            .await;

        let conn =
            ConnectionDescriptor::new(&server.uri(), "hotels", "test-key", "2023-11-01").unwrap();
        let client = SearchClient::new(conn, Duration::from_millis(500)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("hotels.json");
        let req = ExportRequest {
            page_size: 10,
            ..ExportRequest::new(ExportQuery::default(), out.clone())
        };

        let result = export_to_file(&client, req, None).await.unwrap();

        assert_eq!(result.documents_exported, 3);
        assert_eq!(read(&out).await.len(), 3);
    }
}
