//! REST client for an Azure AI Search index
//!
//! Implements [`DocumentCollection`] with two endpoints of the data plane:
//! - `POST indexes/{index}/docs/search` for counting and paging
//! - `POST indexes/{index}/docs/index` for batch writes
//!
//! Every request carries the admin `api-key` header, the configured
//! `api-version` and a fresh `client-request-id` that is logged so a failed
//! call can be matched against service-side diagnostics.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::connection::ConnectionDescriptor;
use crate::error::{RequestKind, Result, classify_response};

use super::{
    Document, DocumentCollection, IndexAction, IndexingOutcome, SearchRequest, strip_annotations,
};

/// Search body, field names as the service expects them.
#[derive(Debug, Serialize)]
struct SearchBody<'a> {
    search: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    select: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    orderby: Option<&'a str>,
    top: usize,
    skip: usize,
    count: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "@odata.count")]
    count: Option<u64>,
    #[serde(default)]
    value: Vec<Document>,
}

#[derive(Debug, Serialize)]
struct IndexBody {
    value: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct IndexResponse {
    #[serde(default)]
    value: Vec<IndexingOutcome>,
}

/// HTTP client bound to one index
pub struct SearchClient {
    http: reqwest::Client,
    conn: ConnectionDescriptor,
}

impl SearchClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `conn` - Endpoint, index and credential
    /// * `timeout` - Per-request timeout
    ///
    /// # Returns
    /// * `Result<Self>` - Client or error if the HTTP stack cannot be built
    pub fn new(conn: ConnectionDescriptor, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("search-porter/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, conn })
    }

    /// POST a JSON body to a document operation and decode the answer
    async fn post<B, T>(&self, operation: &str, body: &B, kind: RequestKind) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.conn.docs_url(operation)?;
        let request_id = Uuid::new_v4();
        debug!("POST {} (client-request-id {})", url, request_id);

        let resp = self
            .http
            .post(url)
            .query(&[("api-version", self.conn.api_version())])
            .header("api-key", self.conn.api_key())
            .header("client-request-id", request_id.to_string())
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        trace!("{} answered {} ({} bytes)", request_id, status, text.len());

        // 207 Multi-Status: some documents of an index batch failed, the
        // body still lists every outcome.
        if !status.is_success() && status != StatusCode::MULTI_STATUS {
            debug!("Request {} failed with {}", request_id, status);
            return Err(classify_response(status.as_u16(), &text, kind));
        }

        serde_json::from_str(&text).map_err(|e| {
            format!("Unexpected response from {}: {}", self.conn, e).into()
        })
    }
}

#[async_trait]
impl DocumentCollection for SearchClient {
    fn name(&self) -> &str {
        self.conn.index()
    }

    async fn count(&self, filter: Option<&str>) -> Result<Option<u64>> {
        let body = SearchBody {
            search: "*",
            filter,
            select: None,
            orderby: None,
            top: 0,
            skip: 0,
            count: true,
        };
        let resp: SearchResponse = self.post("docs/search", &body, RequestKind::Query).await?;
        Ok(resp.count)
    }

    async fn search_page(&self, request: &SearchRequest) -> Result<Vec<Document>> {
        let body = SearchBody {
            search: "*",
            filter: request.filter.as_deref(),
            select: (!request.select.is_empty()).then(|| request.select.join(",")),
            orderby: request.order_by.as_deref(),
            top: request.top,
            skip: request.skip,
            count: false,
        };
        let resp: SearchResponse = self.post("docs/search", &body, RequestKind::Query).await?;
        Ok(resp.value.into_iter().map(strip_annotations).collect())
    }

    async fn index_batch(
        &self,
        batch: &[Document],
        action: IndexAction,
    ) -> Result<Vec<IndexingOutcome>> {
        let value = batch
            .iter()
            .map(|doc| {
                let mut action_doc = Document::new();
                action_doc.insert(
                    "@search.action".to_string(),
                    Value::String(action.as_str().to_string()),
                );
                action_doc.extend(doc.iter().map(|(k, v)| (k.clone(), v.clone())));
                action_doc
            })
            .collect();

        let resp: IndexResponse = self
            .post("docs/index", &IndexBody { value }, RequestKind::Write)
            .await?;
        Ok(resp.value)
    }
}
