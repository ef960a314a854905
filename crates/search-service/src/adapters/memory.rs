use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::{SearchQuery, SearchRecord, StoreError};
use crate::ports::outbound::SearchStore;

/// DashMap-backed search projection keyed by post id.
pub struct InMemorySearchStore {
    records: DashMap<String, SearchRecord>,
    available: AtomicBool,
}

impl InMemorySearchStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    #[must_use]
    pub fn get(&self, post_id: &str) -> Option<SearchRecord> {
        self.records.get(post_id).map(|r| r.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("search store offline".to_string()))
        }
    }
}

impl Default for InMemorySearchStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchStore for InMemorySearchStore {
    async fn insert(&self, record: SearchRecord) -> Result<(), StoreError> {
        self.check_available()?;
        match self.records.entry(record.post_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateKey(record.post_id)),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn delete_by_post_id(&self, post_id: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self.records.remove(post_id).is_some())
    }

    async fn search(
        &self,
        query: &SearchQuery,
        limit: usize,
    ) -> Result<Vec<SearchRecord>, StoreError> {
        self.check_available()?;
        let snapshot: Vec<SearchRecord> = self.records.iter().map(|r| r.clone()).collect();
        Ok(query.rank(&snapshot, limit))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.check_available()?;
        Ok(self.records.len() as u64)
    }
}
