//! Unified error types for providers and the provider factory

use confset_schema::{ConversionError, SchemaError};
use confset_store::StoreError;
use confset_validation::{ValidationStatus, ValidatorError};

/// Provider result type
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Coarse classification of a [`ProviderError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Backing storage could not be reached
    StoreUnavailable,
    /// Stored bytes are not a JSON object
    DecodeError,
    /// Store refused a write
    ReadOnly,
    /// Strict validation failed
    ValidationFailed,
    /// Stored data carries no schema version
    MissingVersionData,
    /// No converter for a migration hop
    MissingConverter,
    /// Provider has no schema
    SchemaNotSupported,
    /// Schema lookup or definition failure
    Schema,
    /// A converter rejected the data
    ConversionFailed,
    /// Version chain loops or does not lead to the target
    BrokenVersionChain,
    /// Stored data already carries another version
    AlreadyVersioned,
}

/// Errors returned by [`ConfigurationProvider`](crate::ConfigurationProvider)
/// and [`SchemaMigrator`](crate::SchemaMigrator)
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Strict validation reported errors
    #[error("configuration failed validation: {}", describe(.0))]
    ValidationFailed(ValidationStatus),

    /// Migration needs a recorded version
    #[error("stored configuration of provider '{provider}' has no schema version; stamp it first")]
    MissingVersionData { provider: String },

    /// Migration hop has no converter
    #[error("no converter to migrate schema '{schema_id}' across version {version}{}", converter_suffix(.converter_id.as_deref()))]
    MissingConverter {
        schema_id: String,
        version: String,
        converter_id: Option<String>,
    },

    /// Schema-dependent operation on a provider without a schema
    #[error("provider '{provider}' does not support schemas")]
    SchemaNotSupported { provider: String },

    /// Schema resolution failure
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Converter rejected the data
    #[error("failed to convert configuration from {from} to {to}: {source}")]
    Conversion {
        from: String,
        to: String,
        #[source]
        source: ConversionError,
    },

    /// Step guard tripped while walking the version chain
    #[error("version chain of schema '{schema_id}' loops after {hops} hops")]
    MigrationCycle { schema_id: String, hops: usize },

    /// Version chain ends before reaching the target
    #[error("schema '{schema_id}' has no version path from {from} to {to}")]
    VersionUnreachable {
        schema_id: String,
        from: String,
        to: String,
    },

    /// Stamping a configuration that already records a version
    #[error("stored configuration of provider '{provider}' is already at version {version}")]
    AlreadyVersioned { provider: String, version: String },
}

impl ProviderError {
    /// Error classification
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(StoreError::Unavailable { .. }) => ErrorKind::StoreUnavailable,
            Self::Store(StoreError::ReadOnly(_)) => ErrorKind::ReadOnly,
            Self::Store(_) => ErrorKind::DecodeError,
            Self::ValidationFailed(_) => ErrorKind::ValidationFailed,
            Self::MissingVersionData { .. } => ErrorKind::MissingVersionData,
            Self::MissingConverter { .. } => ErrorKind::MissingConverter,
            Self::SchemaNotSupported { .. } => ErrorKind::SchemaNotSupported,
            Self::Schema(_) => ErrorKind::Schema,
            Self::Conversion { .. } => ErrorKind::ConversionFailed,
            Self::MigrationCycle { .. } | Self::VersionUnreachable { .. } => {
                ErrorKind::BrokenVersionChain
            }
            Self::AlreadyVersioned { .. } => ErrorKind::AlreadyVersioned,
        }
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_retryable())
    }

    /// Validation status carried by a validation failure
    #[must_use]
    pub fn validation_status(&self) -> Option<&ValidationStatus> {
        match self {
            Self::ValidationFailed(status) => Some(status),
            _ => None,
        }
    }
}

fn describe(status: &ValidationStatus) -> String {
    status
        .errors()
        .iter()
        .map(|error| format!("{} ({})", error.message_literal, display_pointer(&error.pointer)))
        .collect::<Vec<_>>()
        .join("; ")
}

fn display_pointer(pointer: &str) -> &str {
    if pointer.is_empty() {
        "/"
    } else {
        pointer
    }
}

fn converter_suffix(converter_id: Option<&str>) -> String {
    converter_id
        .map(|id| format!(" (converter '{id}' is not registered)"))
        .unwrap_or_default()
}

/// Errors raised while building providers from configuration
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    /// No constructor registered for a store type
    #[error("unknown store type: '{0}'")]
    UnknownStoreType(String),

    /// No constructor registered for a validator type
    #[error("unknown validator type: '{0}'")]
    UnknownValidatorType(String),

    /// Constructor arguments do not fit the type
    #[error("invalid arguments for '{type_name}': {reason}")]
    InvalidArgs { type_name: String, reason: String },

    /// No provider configured under the id
    #[error("unknown provider: '{0}'")]
    UnknownProvider(String),

    /// Configuration document could not be parsed
    #[error("failed to parse factory configuration: {0}")]
    Config(String),

    /// Schema lookup failure
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Validator construction failure
    #[error(transparent)]
    Validator(#[from] ValidatorError),

    /// Store construction failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FactoryError {
    /// Create invalid arguments error
    pub fn invalid_args(type_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidArgs {
            type_name: type_name.into(),
            reason: reason.to_string(),
        }
    }
}
