//! confset Store Layer
//!
//! Persistence of exactly one configuration blob per store.
//!
//! # Architecture
//!
//! ```text
//! load() ──► in-process tier ──miss──► shared tier ──miss──► StorageBackend
//!            (bounded TTL)           (bounded TTL)          fetch_raw_blob
//!                 ▲                        ▲
//!                 └──── invalidate() ──────┘ ◄── store() / host change notification
//! ```
//!
//! Both tiers hold the canonical serialized payload, never a decoded blob:
//! every read decodes a fresh [`Blob`](confset_schema::Blob) that the caller
//! owns outright.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod backend;
pub mod blob;
pub mod caching;
pub mod config;
pub mod error;
pub mod shared;
pub mod static_store;
pub mod store;

pub use backend::{Actor, FileBackend, MemoryBackend, StorageBackend, WriteRecord};
pub use blob::{Decoded, VERSION_FIELD};
pub use caching::CachingStore;
pub use config::CacheConfig;
pub use error::{BackendError, StoreError};
pub use shared::{MokaSharedCache, SharedCache};
pub use static_store::StaticStore;
pub use store::ConfigurationStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
