//! # Cache-Aside Layer
//!
//! `get_or_load` serves snapshots from the cache and repopulates it from the
//! authoritative store on a miss. `invalidate` runs on every mutation and
//! must succeed before the mutation is acknowledged to its caller.
//!
//! ## Concurrent readers
//!
//! A reader that loaded from the store before a mutation committed can write
//! its stale snapshot back after `invalidate` swept the keys. Mutations
//! therefore call `evict_stale` once more after their remaining steps, which
//! removes any snapshot written in that window. A reader whose write lands
//! after the second sweep still leaves a stale snapshot behind until its TTL
//! expires (`entity_ttl` for `post:<id>`, `collection_ttl` for pages).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::CacheConfig;
use crate::errors::CacheError;
use crate::keys::CacheKeys;
use crate::store::CacheStore;

/// Where a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    Cache,
    Loader,
}

/// A serialized document as it is stored in (or was just written to) the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    body: String,
    source: SnapshotSource,
}

impl Snapshot {
    /// The serialized document, verbatim.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn into_body(self) -> String {
        self.body
    }

    #[must_use]
    pub fn source(&self) -> SnapshotSource {
        self.source
    }

    #[must_use]
    pub fn is_hit(&self) -> bool {
        self.source == SnapshotSource::Cache
    }

    /// Deserialize the snapshot.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CacheError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Cache-aside reads and mutation invalidation for one entity type.
#[derive(Clone)]
pub struct CacheAside {
    store: Arc<dyn CacheStore>,
    keys: CacheKeys,
    config: CacheConfig,
}

impl CacheAside {
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>, keys: CacheKeys, config: CacheConfig) -> Self {
        Self {
            store,
            keys,
            config,
        }
    }

    #[must_use]
    pub fn keys(&self) -> &CacheKeys {
        &self.keys
    }

    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Return the cached snapshot for `key`, or load, serialize and cache it.
    ///
    /// A loader result of `None` is returned as `None` and nothing is cached.
    /// Cache read and write failures are logged and never fail the call; only
    /// loader errors and serialization failures are returned.
    pub async fn get_or_load<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> Result<Option<Snapshot>, E>
    where
        T: Serialize,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        match self.store.get(key).await {
            Ok(Some(body)) => {
                debug!(key, "Cache hit");
                return Ok(Some(Snapshot {
                    body,
                    source: SnapshotSource::Cache,
                }));
            }
            Ok(None) => debug!(key, "Cache miss"),
            Err(e) => warn!(key, error = %e, "Cache read failed, falling through"),
        }

        let Some(value) = loader().await? else {
            return Ok(None);
        };
        let body = serde_json::to_string(&value).map_err(CacheError::from)?;

        if let Err(e) = self.store.set_ex(key, &body, ttl).await {
            warn!(key, error = %e, "Cache repopulate failed");
        }

        Ok(Some(Snapshot {
            body,
            source: SnapshotSource::Loader,
        }))
    }

    /// Cache-aside read of a single entity with the entity TTL.
    pub async fn get_entity<T, E, F, Fut>(&self, id: &str, loader: F) -> Result<Option<Snapshot>, E>
    where
        T: Serialize,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let key = self.keys.entity(id);
        self.get_or_load(&key, self.config.entity_ttl(), loader)
            .await
    }

    /// Cache-aside read of one collection page with the collection TTL.
    pub async fn get_collection<T, E, F, Fut>(
        &self,
        page: u32,
        limit: u32,
        loader: F,
    ) -> Result<Option<Snapshot>, E>
    where
        T: Serialize,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let key = self.keys.collection(page, limit);
        self.get_or_load(&key, self.config.collection_ttl(), loader)
            .await
    }

    /// Delete the entity key for `id` and every collection key.
    ///
    /// Collection pages are swept regardless of whether they contain `id`:
    /// page membership shifts with every insert and delete. Returns the number
    /// of keys removed.
    pub async fn invalidate(&self, id: &str) -> Result<u64, CacheError> {
        let (removed, collection_keys) = self.sweep(id).await?;
        info!(
            entity_key = %self.keys.entity(id),
            collection_keys,
            "Cache invalidated"
        );
        Ok(removed)
    }

    /// Repeat the sweep of `invalidate` once the mutation has finished, to
    /// drop snapshots that in-flight readers wrote back in the meantime.
    pub async fn evict_stale(&self, id: &str) -> Result<u64, CacheError> {
        let (removed, _) = self.sweep(id).await?;
        if removed > 0 {
            info!(entity_key = %self.keys.entity(id), removed, "Evicted stale snapshots");
        }
        Ok(removed)
    }

    /// Delete the entity key and every collection key. Returns the keys
    /// removed and the collection keys found.
    async fn sweep(&self, id: &str) -> Result<(u64, usize), CacheError> {
        let entity_key = self.keys.entity(id);
        let mut removed = self.store.delete(std::slice::from_ref(&entity_key)).await?;

        let pattern = self.keys.collection_pattern();
        let collection_keys = self
            .store
            .scan_match(&pattern, self.config.scan_batch)
            .await?;
        for chunk in collection_keys.chunks(self.config.scan_batch.max(1)) {
            removed += self.store.delete(chunk).await?;
        }

        Ok((removed, collection_keys.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCacheStore;
    use async_trait::async_trait;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Doc {
        id: String,
        content: String,
    }

    fn doc(id: &str, content: &str) -> Doc {
        Doc {
            id: id.to_string(),
            content: content.to_string(),
        }
    }

    fn aside(store: Arc<dyn CacheStore>) -> CacheAside {
        CacheAside::new(store, CacheKeys::posts(), CacheConfig::default())
    }

    #[tokio::test]
    async fn test_miss_loads_and_populates() {
        let store = Arc::new(InMemoryCacheStore::new());
        let cache = aside(store.clone());
        let loads = AtomicU32::new(0);

        for _ in 0..2 {
            let snapshot = cache
                .get_entity("p1", || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, CacheError>(Some(doc("p1", "hello")))
                })
                .await
                .unwrap()
                .unwrap();
            assert_eq!(snapshot.decode::<Doc>().unwrap(), doc("p1", "hello"));
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(store.get("post:p1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_hit_returns_cached_body_verbatim() {
        let store = Arc::new(InMemoryCacheStore::new());
        store
            .set_ex("post:p1", r#"{"id":"p1","content":"cached"}"#, Duration::from_secs(60))
            .await
            .unwrap();
        let cache = aside(store);

        let snapshot = cache
            .get_entity("p1", || async {
                Ok::<_, CacheError>(Some(doc("p1", "from store")))
            })
            .await
            .unwrap()
            .unwrap();

        assert!(snapshot.is_hit());
        assert_eq!(snapshot.body(), r#"{"id":"p1","content":"cached"}"#);
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let store = Arc::new(InMemoryCacheStore::new());
        let cache = aside(store.clone());

        let result = cache
            .get_entity("missing", || async { Ok::<Option<Doc>, CacheError>(None) })
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_sweeps_entity_and_all_pages() {
        let store = Arc::new(InMemoryCacheStore::new());
        let cache = aside(store.clone());
        let ttl = Duration::from_secs(60);
        store.set_ex("post:p1", "{}", ttl).await.unwrap();
        store.set_ex("post:p2", "{}", ttl).await.unwrap();
        store.set_ex("posts:1:10", "[]", ttl).await.unwrap();
        store.set_ex("posts:7:25", "[]", ttl).await.unwrap();

        let removed = cache.invalidate("p1").await.unwrap();

        assert_eq!(removed, 3);
        assert!(store.get("post:p1").await.unwrap().is_none());
        assert!(store.get("posts:1:10").await.unwrap().is_none());
        assert!(store.get("posts:7:25").await.unwrap().is_none());
        // Other entities keep their snapshots.
        assert!(store.get("post:p2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_read_after_invalidate_falls_through() {
        let store = Arc::new(InMemoryCacheStore::new());
        let cache = aside(store);

        cache
            .get_entity("p1", || async { Ok::<_, CacheError>(Some(doc("p1", "old"))) })
            .await
            .unwrap();
        cache.invalidate("p1").await.unwrap();

        let snapshot = cache
            .get_entity("p1", || async { Ok::<_, CacheError>(Some(doc("p1", "new"))) })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(snapshot.source(), SnapshotSource::Loader);
        assert_eq!(snapshot.decode::<Doc>().unwrap().content, "new");
    }

    #[tokio::test]
    async fn test_evict_stale_removes_snapshot_written_during_mutation() {
        let store = Arc::new(InMemoryCacheStore::new());
        let cache = aside(store.clone());
        let (loaded_tx, loaded_rx) = tokio::sync::oneshot::channel::<()>();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let reader = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_entity("p1", move || async move {
                        // Row read before the mutation commits.
                        let _ = loaded_tx.send(());
                        let _ = release_rx.await;
                        Ok::<_, CacheError>(Some(doc("p1", "old")))
                    })
                    .await
                    .unwrap()
            })
        };

        loaded_rx.await.unwrap();
        cache.invalidate("p1").await.unwrap();
        release_tx.send(()).unwrap();
        reader.await.unwrap();
        assert!(store.get("post:p1").await.unwrap().is_some());

        assert_eq!(cache.evict_stale("p1").await.unwrap(), 1);
        assert!(store.get("post:p1").await.unwrap().is_none());
        assert_eq!(cache.evict_stale("p1").await.unwrap(), 0);
    }

    /// Store whose every call fails while `down` is set.
    struct FlakyStore {
        inner: InMemoryCacheStore,
        down: AtomicBool,
    }

    impl FlakyStore {
        fn check(&self) -> Result<(), CacheError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(CacheError::Unavailable("connection refused".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CacheStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            self.check()?;
            self.inner.get(key).await
        }
        async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
            self.check()?;
            self.inner.set_ex(key, value, ttl).await
        }
        async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
            self.check()?;
            self.inner.delete(keys).await
        }
        async fn scan_match(&self, pattern: &str, batch: usize) -> Result<Vec<String>, CacheError> {
            self.check()?;
            self.inner.scan_match(pattern, batch).await
        }
    }

    #[tokio::test]
    async fn test_read_survives_store_outage() {
        let store = Arc::new(FlakyStore {
            inner: InMemoryCacheStore::new(),
            down: AtomicBool::new(true),
        });
        let cache = aside(store);

        let snapshot = cache
            .get_collection(1, 10, || async {
                Ok::<_, CacheError>(Some(vec![doc("p1", "hello")]))
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(snapshot.source(), SnapshotSource::Loader);
    }

    #[tokio::test]
    async fn test_invalidate_reports_store_outage() {
        let store = Arc::new(FlakyStore {
            inner: InMemoryCacheStore::new(),
            down: AtomicBool::new(true),
        });
        let cache = aside(store);

        let result = cache.invalidate("p1").await;
        assert!(matches!(result, Err(CacheError::Unavailable(_))));
    }
}
