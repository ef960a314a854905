//! # Search Query Service

use std::sync::Arc;

use tracing::info;

use crate::domain::{SearchQuery, SearchRecord, StoreError, MAX_RESULTS};
use crate::ports::SearchStore;

/// Read side of the search projection.
pub struct SearchService {
    store: Arc<dyn SearchStore>,
}

impl SearchService {
    #[must_use]
    pub fn new(store: Arc<dyn SearchStore>) -> Self {
        Self { store }
    }

    /// Up to ten posts matching `text`, best match first.
    ///
    /// A query without any word characters matches nothing.
    pub async fn search(&self, text: &str) -> Result<Vec<SearchRecord>, StoreError> {
        let query = SearchQuery::parse(text);
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let results = self.store.search(&query, MAX_RESULTS).await?;
        info!(query = text, results = results.len(), "Posts searched");
        Ok(results)
    }
}
