//! Error types for stores and storage backends

use std::error::Error as StdError;

/// Failure reported by a storage backend
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl BackendError {
    /// Create backend error from a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create backend error wrapping an underlying cause
    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Error message
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend fetch or write failed; callers may retry
    #[error("store at {location} unavailable: {source}")]
    Unavailable {
        location: String,
        #[source]
        source: BackendError,
    },

    /// Stored bytes are not valid JSON
    #[error("stored configuration at {location} is not valid JSON: {source}")]
    Decode {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    /// Stored JSON is not an object
    #[error("stored configuration at {location} must be a JSON object, found {found}")]
    NotAnObject { location: String, found: &'static str },

    /// `$version` marker is present but not a string
    #[error("stored configuration at {location} has a non-string version marker")]
    InvalidVersionMarker { location: String },

    /// Blob could not be serialized for writing
    #[error("failed to encode configuration: {0}")]
    Encode(#[source] serde_json::Error),

    /// Store does not accept writes
    #[error("store at {0} is read-only")]
    ReadOnly(String),
}

impl StoreError {
    /// Create unavailable error for location
    pub fn unavailable(location: impl Into<String>, source: BackendError) -> Self {
        Self::Unavailable {
            location: location.into(),
            source,
        }
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// Check if the stored bytes themselves are broken
    #[inline]
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::NotAnObject { .. } | Self::InvalidVersionMarker { .. }
        )
    }
}
