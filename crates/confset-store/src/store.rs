//! Store abstraction

use crate::backend::Actor;
use crate::blob::Decoded;
use crate::error::StoreError;
use async_trait::async_trait;
use confset_schema::Blob;
use std::fmt;

/// Persistence of one configuration blob
///
/// Every successful read returns a blob owned by the caller; mutating it
/// never affects later reads.
#[async_trait]
pub trait ConfigurationStore: Send + Sync + fmt::Debug {
    /// Load the blob, going through caches where the store has them
    async fn load(&self) -> Result<Blob, StoreError>;

    /// Load the blob straight from the backing storage without touching caches
    async fn load_uncached(&self) -> Result<Blob, StoreError>;

    /// Load the blob together with the schema version it was written under
    ///
    /// Data and version come from the same payload.
    async fn load_versioned(&self) -> Result<Decoded, StoreError>;

    /// Schema version the stored data was written under
    async fn version(&self) -> Result<Option<String>, StoreError> {
        Ok(self.load_versioned().await?.version)
    }

    /// Replace the stored blob
    ///
    /// `version` is recorded alongside the data; `None` leaves the data
    /// unversioned.
    async fn store(
        &self,
        blob: &Blob,
        version: Option<&str>,
        actor: &Actor,
        summary: &str,
    ) -> Result<(), StoreError>;

    /// Drop cached state so the next [`load`](Self::load) re-reads
    async fn invalidate(&self);

    /// Backing location, for stores that have one
    fn location(&self) -> Option<&str>;
}
