//! In-memory document collection
//!
//! A keyed store with the same write semantics as the search service:
//! `upload` replaces, `merge` overlays fields and fails for unknown keys,
//! `mergeOrUpload` overlays or creates. Filters are not parsed; callers
//! register the expressions they intend to use together with a predicate,
//! and any other expression is rejected the way the service rejects an
//! invalid filter.
//!
//! Call counters and failure injection let tests assert how many requests a
//! pipeline made and how it reacts to service errors.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{QueryError, RequestKind, Result, classify_response};

use super::{Document, DocumentCollection, IndexAction, IndexingOutcome, SearchRequest};

type Predicate = Box<dyn Fn(&Document) -> bool + Send + Sync>;

/// Keyed document store implementing [`DocumentCollection`]
pub struct InMemoryCollection {
    name: String,
    key_field: String,
    docs: Mutex<BTreeMap<String, Document>>,
    filters: HashMap<String, Predicate>,
    injected: Mutex<HashMap<usize, u16>>,
    reject_all: Option<u16>,
    search_calls: AtomicUsize,
    index_calls: AtomicUsize,
}

impl InMemoryCollection {
    /// Create an empty collection keyed by `key_field`
    pub fn new(name: &str, key_field: &str) -> Self {
        Self {
            name: name.to_string(),
            key_field: key_field.to_string(),
            docs: Mutex::new(BTreeMap::new()),
            filters: HashMap::new(),
            injected: Mutex::new(HashMap::new()),
            reject_all: None,
            search_calls: AtomicUsize::new(0),
            index_calls: AtomicUsize::new(0),
        }
    }

    /// Seed the collection, replacing documents with the same key
    pub fn with_documents(self, docs: impl IntoIterator<Item = Document>) -> Self {
        {
            let mut store = self.lock();
            for doc in docs {
                if let Some(key) = key_of(&doc, &self.key_field) {
                    store.insert(key, doc);
                }
            }
        }
        self
    }

    /// Accept `expr` as a filter, matching documents with `predicate`
    pub fn with_filter(
        mut self,
        expr: &str,
        predicate: impl Fn(&Document) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filters.insert(expr.to_string(), Box::new(predicate));
        self
    }

    /// Answer every request with `status`, e.g. 401 for a bad key
    pub fn rejecting_all(mut self, status: u16) -> Self {
        self.reject_all = Some(status);
        self
    }

    /// Fail the `call`-th index request (1-based) with `status`
    pub fn fail_index_call(&self, call: usize, status: u16) {
        self.injected
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(call, status);
    }

    /// Stored document for `key`
    pub fn get(&self, key: &str) -> Option<Document> {
        self.lock().get(key).cloned()
    }

    /// All stored documents in key order
    pub fn documents(&self) -> Vec<Document> {
        self.lock().values().cloned().collect()
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the collection holds no documents
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of count and search requests received
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Number of index requests received
    pub fn index_calls(&self) -> usize {
        self.index_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Document>> {
        self.docs.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn matching(&self, filter: Option<&str>) -> Result<Vec<Document>> {
        let predicate = match filter {
            None => None,
            Some(expr) => Some(self.filters.get(expr).ok_or_else(|| QueryError {
                code: Some("InvalidRequestParameter".to_string()),
                message: format!("Invalid expression: {expr}"),
            })?),
        };
        Ok(self
            .lock()
            .values()
            .filter(|doc| predicate.is_none_or(|p| p(doc)))
            .cloned()
            .collect())
    }

    fn apply(
        &self,
        store: &mut BTreeMap<String, Document>,
        doc: &Document,
        action: IndexAction,
    ) -> IndexingOutcome {
        let Some(key) = key_of(doc, &self.key_field) else {
            return IndexingOutcome::failed(
                "",
                400,
                format!("The request is invalid. Missing key field '{}'.", self.key_field),
            );
        };

        let exists = store.contains_key(&key);
        match action {
            IndexAction::Upload => {
                store.insert(key.clone(), doc.clone());
                IndexingOutcome::ok(key, if exists { 200 } else { 201 })
            }
            IndexAction::Merge if !exists => {
                IndexingOutcome::failed(key, 404, "Document not found.")
            }
            IndexAction::Merge | IndexAction::MergeOrUpload => {
                let stored = store.entry(key.clone()).or_default();
                for (field, value) in doc {
                    stored.insert(field.clone(), value.clone());
                }
                IndexingOutcome::ok(key, if exists { 200 } else { 201 })
            }
        }
    }
}

fn key_of(doc: &Document, key_field: &str) -> Option<String> {
    match doc.get(key_field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn project(doc: Document, select: &[String]) -> Document {
    if select.is_empty() {
        return doc;
    }
    doc.into_iter()
        .filter(|(field, _)| select.iter().any(|s| s == field))
        .collect()
}

#[async_trait]
impl DocumentCollection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn count(&self, filter: Option<&str>) -> Result<Option<u64>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.reject_all {
            return Err(classify_response(status, "", RequestKind::Query));
        }
        Ok(Some(self.matching(filter)?.len() as u64))
    }

    async fn search_page(&self, request: &SearchRequest) -> Result<Vec<Document>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.reject_all {
            return Err(classify_response(status, "", RequestKind::Query));
        }
        Ok(self
            .matching(request.filter.as_deref())?
            .into_iter()
            .skip(request.skip)
            .take(request.top)
            .map(|doc| project(doc, &request.select))
            .collect())
    }

    async fn index_batch(
        &self,
        batch: &[Document],
        action: IndexAction,
    ) -> Result<Vec<IndexingOutcome>> {
        let call = self.index_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(status) = self.reject_all {
            return Err(classify_response(status, "", RequestKind::Write));
        }
        let injected = self
            .injected
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&call);
        if let Some(status) = injected {
            let body = format!(r#"{{"error":{{"code":"Injected","message":"injected failure on call {call}"}}}}"#);
            return Err(classify_response(status, &body, RequestKind::Write));
        }

        let mut store = self.lock();
        Ok(batch
            .iter()
            .map(|doc| self.apply(&mut store, doc, action))
            .collect())
    }
}
