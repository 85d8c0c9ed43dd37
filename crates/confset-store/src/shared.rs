//! Shared cache tier
//!
//! The shared tier is visible to every store in the process (and, behind a
//! host implementation, to other processes). Entries carry their own TTL so
//! a missed invalidation is eventually corrected.

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Key/value cache with per-entry TTL
#[async_trait]
pub trait SharedCache: Send + Sync + fmt::Debug {
    /// Cached payload for `key`, if present and not expired
    async fn get(&self, key: &str) -> Option<Arc<str>>;

    /// Cache `value` under `key` for `ttl`; a zero TTL means do not cache
    async fn set(&self, key: &str, value: Arc<str>, ttl: Duration);

    /// Drop `key`
    async fn delete(&self, key: &str);
}

#[derive(Debug, Clone)]
struct Entry {
    payload: Arc<str>,
    ttl: Duration,
}

struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process [`SharedCache`] backed by moka
#[derive(Clone)]
pub struct MokaSharedCache {
    inner: Cache<String, Entry>,
}

impl MokaSharedCache {
    /// Create cache with max capacity
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    /// Get approximate entry count
    #[inline]
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for MokaSharedCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl fmt::Debug for MokaSharedCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MokaSharedCache")
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}

#[async_trait]
impl SharedCache for MokaSharedCache {
    async fn get(&self, key: &str) -> Option<Arc<str>> {
        self.inner.get(key).await.map(|entry| entry.payload)
    }

    async fn set(&self, key: &str, value: Arc<str>, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        self.inner
            .insert(key.to_string(), Entry { payload: value, ttl })
            .await;
    }

    async fn delete(&self, key: &str) {
        self.inner.invalidate(key).await;
    }
}
