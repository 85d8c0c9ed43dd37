//! Two-tier caching store
//!
//! Reads go through an in-process tier, then the shared tier, then the
//! backend. Entries of both tiers expire after the configured TTL, so a
//! missed invalidation goes stale for at most that long. Both tiers hold the
//! canonical serialized payload; each read decodes it again.
//!
//! Only successful fetches are cached. A failed fetch or an undecodable
//! payload reaches the caller and leaves both tiers untouched. A fetch that
//! overlaps an [`invalidate`](ConfigurationStore::invalidate) is handed to
//! its caller but not cached.

use crate::backend::{Actor, StorageBackend};
use crate::blob::{self, Decoded};
use crate::config::CacheConfig;
use crate::error::StoreError;
use crate::shared::SharedCache;
use crate::store::ConfigurationStore;
use async_trait::async_trait;
use confset_schema::Blob;
use moka::future::Cache;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// [`ConfigurationStore`] over a [`StorageBackend`] with two cache tiers
pub struct CachingStore<B> {
    backend: B,
    local: Cache<String, Arc<str>>,
    shared: Arc<dyn SharedCache>,
    config: CacheConfig,
    key: String,
    // Bumped on every invalidation
    generation: AtomicU64,
}

impl<B: StorageBackend> CachingStore<B> {
    /// Create store over `backend` using `shared` as the shared tier
    pub fn new(backend: B, shared: Arc<dyn SharedCache>, config: CacheConfig) -> Self {
        let key = config.key_for(backend.location());
        let mut local = Cache::builder().max_capacity(config.local_capacity.max(1));
        if !config.shared_ttl().is_zero() {
            local = local.time_to_live(config.shared_ttl());
        }
        Self {
            local: local.build(),
            backend,
            shared,
            config,
            key,
            generation: AtomicU64::new(0),
        }
    }

    /// Underlying backend
    #[inline]
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Key under which both tiers cache this store's payload
    #[inline]
    #[must_use]
    pub fn cache_key(&self) -> &str {
        &self.key
    }

    async fn cached_payload(&self) -> Result<Arc<str>, StoreError> {
        let location = self.backend.location();
        if self.config.shared_ttl().is_zero() {
            return Ok(Arc::from(self.fetch_canonical().await?));
        }
        if let Some(payload) = self.local.get(&self.key).await {
            tracing::debug!(location, tier = "local", "store cache hit");
            return Ok(payload);
        }

        let generation = self.generation.load(Ordering::Acquire);
        if let Some(payload) = self.shared.get(&self.key).await {
            tracing::debug!(location, tier = "shared", "store cache hit");
            if self.generation.load(Ordering::Acquire) == generation {
                self.local.insert(self.key.clone(), Arc::clone(&payload)).await;
            }
            return Ok(payload);
        }

        tracing::debug!(location, "store cache miss");
        let payload: Arc<str> = Arc::from(self.fetch_canonical().await?);
        if self.generation.load(Ordering::Acquire) != generation {
            tracing::debug!(location, "store invalidated during fetch, not caching");
            return Ok(payload);
        }
        self.shared
            .set(&self.key, Arc::clone(&payload), self.config.shared_ttl())
            .await;
        self.local.insert(self.key.clone(), Arc::clone(&payload)).await;
        Ok(payload)
    }

    async fn fetch_canonical(&self) -> Result<String, StoreError> {
        let location = self.backend.location();
        let raw = self
            .backend
            .fetch_raw_blob()
            .await
            .map_err(|e| StoreError::unavailable(location, e))?;
        blob::canonicalize(location, raw.as_deref())
    }
}

#[async_trait]
impl<B: StorageBackend> ConfigurationStore for CachingStore<B> {
    async fn load(&self) -> Result<Blob, StoreError> {
        let payload = self.cached_payload().await?;
        Ok(blob::decode(self.backend.location(), &payload)?.data)
    }

    async fn load_uncached(&self) -> Result<Blob, StoreError> {
        let payload = self.fetch_canonical().await?;
        Ok(blob::decode(self.backend.location(), &payload)?.data)
    }

    async fn load_versioned(&self) -> Result<Decoded, StoreError> {
        let payload = self.cached_payload().await?;
        blob::decode(self.backend.location(), &payload)
    }

    async fn store(
        &self,
        blob: &Blob,
        version: Option<&str>,
        actor: &Actor,
        summary: &str,
    ) -> Result<(), StoreError> {
        let location = self.backend.location();
        let payload = blob::encode(blob, version)?;
        self.backend
            .write_raw_blob(&payload, actor, summary)
            .await
            .map_err(|e| StoreError::unavailable(location, e))?;

        tracing::info!(location, %actor, version, "configuration stored");
        self.invalidate().await;
        Ok(())
    }

    async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.local.invalidate(&self.key).await;
        self.shared.delete(&self.key).await;
        tracing::debug!(location = self.backend.location(), "store cache invalidated");
    }

    fn location(&self) -> Option<&str> {
        Some(self.backend.location())
    }
}

impl<B: fmt::Debug> fmt::Debug for CachingStore<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingStore")
            .field("backend", &self.backend)
            .field("key", &self.key)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::shared::MokaSharedCache;
    use serde_json::json;

    fn store(backend: &MemoryBackend) -> CachingStore<MemoryBackend> {
        CachingStore::new(
            backend.clone(),
            Arc::new(MokaSharedCache::default()),
            CacheConfig::default(),
        )
    }

    #[tokio::test]
    async fn missing_blob_loads_as_empty_object() {
        let backend = MemoryBackend::new("memory:empty");
        let store = store(&backend);
        assert!(store.load().await.unwrap().is_empty());
        assert_eq!(store.version().await.unwrap(), None);
    }

    #[tokio::test]
    async fn second_load_is_served_from_cache() {
        let backend = MemoryBackend::with_payload("memory:a", r#"{"A": 1}"#);
        let store = store(&backend);

        store.load().await.unwrap();
        store.load().await.unwrap();
        store.version().await.unwrap();
        assert_eq!(backend.fetch_count(), 1);
    }

    #[tokio::test]
    async fn store_stamps_version_and_invalidates() {
        let backend = MemoryBackend::with_payload("memory:a", r#"{"A": 1}"#);
        let store = store(&backend);
        store.load().await.unwrap();

        let mut blob = Blob::new();
        blob.insert("A".into(), json!(2));
        store
            .store(&blob, Some("1.0.0"), &Actor::new("Admin"), "bump A")
            .await
            .unwrap();

        assert_eq!(store.load().await.unwrap().get("A"), Some(&json!(2)));
        assert_eq!(store.version().await.unwrap().as_deref(), Some("1.0.0"));
        assert_eq!(backend.fetch_count(), 2);
        assert_eq!(backend.writes()[0].summary, "bump A");
    }

    #[tokio::test]
    async fn load_versioned_reads_one_payload() {
        let backend = MemoryBackend::with_payload("memory:a", r#"{"$version": "1.0.0", "A": 1}"#);
        let store = store(&backend);

        let decoded = store.load_versioned().await.unwrap();
        assert_eq!(decoded.version.as_deref(), Some("1.0.0"));
        assert_eq!(decoded.data.get("A"), Some(&json!(1)));
        assert!(!decoded.data.contains_key(blob::VERSION_FIELD));
        assert_eq!(backend.fetch_count(), 1);
    }

    #[tokio::test]
    async fn cache_key_uses_prefix_and_location() {
        let backend = MemoryBackend::new("memory:a");
        let store = CachingStore::new(
            backend,
            Arc::new(MokaSharedCache::default()),
            CacheConfig::default().with_key_prefix("wiki"),
        );
        assert_eq!(store.cache_key(), "wiki:store:memory:a");
        assert_eq!(store.location(), Some("memory:a"));
    }
}
