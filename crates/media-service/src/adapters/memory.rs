use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};

use crate::domain::{BlobError, MediaRecord, StoreError};
use crate::ports::outbound::{BlobStore, MediaStore};

/// DashMap-backed media records.
pub struct InMemoryMediaStore {
    records: DashMap<String, MediaRecord>,
    available: AtomicBool,
}

impl InMemoryMediaStore {
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
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
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
            Err(StoreError::Unavailable("media store offline".to_string()))
        }
    }
}

impl Default for InMemoryMediaStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn insert(&self, record: MediaRecord) -> Result<(), StoreError> {
        self.check_available()?;
        match self.records.entry(record.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateKey(record.id)),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn find_many(&self, ids: &[String]) -> Result<Vec<MediaRecord>, StoreError> {
        self.check_available()?;
        Ok(ids
            .iter()
            .filter_map(|id| self.records.get(id).map(|r| r.clone()))
            .collect())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self.records.remove(id).is_some())
    }

    async fn list_all(&self) -> Result<Vec<MediaRecord>, StoreError> {
        self.check_available()?;
        let mut all: Vec<MediaRecord> = self.records.iter().map(|r| r.clone()).collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }
}

/// Process-local object store.
pub struct InMemoryBlobStore {
    blobs: DashSet<String>,
    available: AtomicBool,
}

impl InMemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            blobs: DashSet::new(),
            available: AtomicBool::new(true),
        }
    }

    pub fn put(&self, public_id: impl Into<String>) {
        self.blobs.insert(public_id.into());
    }

    #[must_use]
    pub fn contains(&self, public_id: &str) -> bool {
        self.blobs.contains(public_id)
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn delete(&self, public_id: &str) -> Result<(), BlobError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(BlobError::Unavailable("object store offline".to_string()));
        }
        match self.blobs.remove(public_id) {
            Some(_) => Ok(()),
            None => Err(BlobError::NotFound(public_id.to_string())),
        }
    }
}
