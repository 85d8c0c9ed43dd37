//! Errors raised while setting up validators

use confset_schema::SchemaError;

/// Validator construction failures
///
/// Violations found in data are not errors: they are reported through
/// [`ValidationStatus`](crate::ValidationStatus).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidatorError {
    /// Schema could not be resolved or built
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Built document was rejected by the JSON Schema compiler
    #[error("invalid JSON schema for '{schema_id}': {message}")]
    InvalidSchema { schema_id: String, message: String },
}
