//! Streaming query abstractions for export operations
//!
//! This module turns the page-at-a-time search API into a pull-based
//! sequence of document batches that the coordinator drains.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::Result;
use crate::search::{Document, DocumentCollection, ExportQuery};

/// Trait for streaming query results in batches
///
/// This provides a unified interface so the coordinator does not care how
/// pages are fetched.
#[async_trait]
pub trait StreamingQuery: Send {
    /// Fetch the next batch of documents
    ///
    /// # Returns
    /// * `Result<Option<Vec<Document>>>` - Next batch of documents, or None if exhausted
    async fn next_batch(&mut self) -> Result<Option<Vec<Document>>>;

    /// Close the query and cleanup resources
    async fn close(&mut self) -> Result<()>;
}

/// Skip-based pager over a [`DocumentCollection`]
///
/// Requests pages of `page_size` documents. With a row cap the last request
/// only asks for what is left, so the cap is enforced client-side and the
/// service never sends more than the cap in total. Paging ends at the cap, on
/// an empty page, or on a page shorter than requested.
pub struct PagedQuery<'a> {
    collection: &'a dyn DocumentCollection,
    query: ExportQuery,
    page_size: usize,
    skip: usize,
    exhausted: bool,
}

impl<'a> PagedQuery<'a> {
    /// Create a new pager
    ///
    /// # Arguments
    /// * `collection` - Collection to read from
    /// * `query` - Select, filter, cap and order
    /// * `page_size` - Documents per request (at least 1)
    pub fn new(collection: &'a dyn DocumentCollection, query: ExportQuery, page_size: usize) -> Self {
        Self {
            collection,
            query,
            page_size: page_size.max(1),
            skip: 0,
            exhausted: false,
        }
    }

    /// Rewind to the first page
    pub fn restart(&mut self) {
        debug!("Restarting query on {}", self.collection.name());
        self.skip = 0;
        self.exhausted = false;
    }

    /// Documents fetched so far
    pub fn fetched(&self) -> usize {
        self.skip
    }

    fn next_page_size(&self) -> usize {
        match self.query.top {
            Some(top) => self.page_size.min(top.saturating_sub(self.skip)),
            None => self.page_size,
        }
    }
}

impl<'c> dyn DocumentCollection + 'c {
    /// Lazy, restartable sequence of the documents matching `query`
    ///
    /// Nothing is requested until the first `next_batch`.
    pub fn query<'s>(&'s self, query: ExportQuery, page_size: usize) -> PagedQuery<'s> {
        PagedQuery::new(self, query, page_size)
    }
}

#[async_trait]
impl StreamingQuery for PagedQuery<'_> {
    async fn next_batch(&mut self) -> Result<Option<Vec<Document>>> {
        if self.exhausted {
            return Ok(None);
        }

        let requested = self.next_page_size();
        if requested == 0 {
            debug!("Row cap reached after {} documents", self.skip);
            self.exhausted = true;
            return Ok(None);
        }

        let request = self.query.page(self.skip, requested);
        let mut page = self.collection.search_page(&request).await?;

        if page.is_empty() {
            debug!("Query exhausted after {} documents", self.skip);
            self.exhausted = true;
            return Ok(None);
        }

        // A service that ignores `top` must not push us past the cap
        page.truncate(requested);
        if page.len() < requested {
            self.exhausted = true;
        }

        self.skip += page.len();
        debug!(
            "Fetched page of {} documents (total: {})",
            page.len(),
            self.skip
        );
        Ok(Some(page))
    }

    async fn close(&mut self) -> Result<()> {
        if !self.exhausted {
            self.exhausted = true;
        }
        info!(
            "Closed query on {} after fetching {} documents",
            self.collection.name(),
            self.skip
        );
        Ok(())
    }
}
