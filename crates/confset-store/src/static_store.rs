//! Read-only store over a fixed blob

use crate::backend::Actor;
use crate::blob::{self, Decoded};
use crate::error::StoreError;
use crate::store::ConfigurationStore;
use async_trait::async_trait;
use confset_schema::Blob;

const STATIC_LOCATION: &str = "static";

/// Store that always returns the same configuration
///
/// The blob is kept serialized and decoded on every read.
#[derive(Debug, Clone)]
pub struct StaticStore {
    payload: String,
}

impl StaticStore {
    /// Create store over `blob`, optionally recording a schema version
    ///
    /// # Errors
    /// Returns [`StoreError::Encode`] if the blob cannot be serialized.
    pub fn new(blob: &Blob, version: Option<&str>) -> Result<Self, StoreError> {
        Ok(Self {
            payload: blob::encode(blob, version)?,
        })
    }

    /// Create store from a JSON document
    ///
    /// # Errors
    /// Returns a decode error if `json` is not a JSON object.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(Self {
            payload: blob::canonicalize(STATIC_LOCATION, Some(json))?,
        })
    }

    /// Empty configuration
    #[must_use]
    pub fn empty() -> Self {
        Self {
            payload: blob::EMPTY_PAYLOAD.to_string(),
        }
    }
}

impl Default for StaticStore {
    fn default() -> Self {
        Self::empty()
    }
}

#[async_trait]
impl ConfigurationStore for StaticStore {
    async fn load(&self) -> Result<Blob, StoreError> {
        Ok(blob::decode(STATIC_LOCATION, &self.payload)?.data)
    }

    async fn load_uncached(&self) -> Result<Blob, StoreError> {
        self.load().await
    }

    async fn load_versioned(&self) -> Result<Decoded, StoreError> {
        blob::decode(STATIC_LOCATION, &self.payload)
    }

    async fn store(
        &self,
        _blob: &Blob,
        _version: Option<&str>,
        _actor: &Actor,
        _summary: &str,
    ) -> Result<(), StoreError> {
        Err(StoreError::ReadOnly(STATIC_LOCATION.to_string()))
    }

    async fn invalidate(&self) {}

    fn location(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn reads_are_isolated() {
        let store = StaticStore::from_json(r#"{"Nested": {"A": 1}}"#).unwrap();

        let mut first = store.load().await.unwrap();
        first.insert("Nested".into(), json!({"A": 2}));

        let second = store.load().await.unwrap();
        assert_eq!(second.get("Nested"), Some(&json!({"A": 1})));
    }

    #[tokio::test]
    async fn keeps_version() {
        let mut blob = Blob::new();
        blob.insert("A".into(), json!(1));
        let store = StaticStore::new(&blob, Some("2.0.0")).unwrap();

        assert_eq!(store.version().await.unwrap().as_deref(), Some("2.0.0"));
        assert_eq!(store.load().await.unwrap(), blob);
    }

    #[tokio::test]
    async fn rejects_writes() {
        let store = StaticStore::empty();
        let err = store
            .store(&Blob::new(), None, &Actor::system(), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ReadOnly(_)));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[test]
    fn rejects_non_object_json() {
        assert!(StaticStore::from_json("[1, 2]").unwrap_err().is_decode_error());
    }
}
