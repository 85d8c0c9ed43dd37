//! Validator abstraction

use crate::status::ValidationStatus;
use confset_schema::{Blob, SchemaBuilder};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// How violations are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Every violation is fatal (writes)
    #[default]
    Strict,
    /// Violations become warnings (reads of stored data)
    Permissive,
}

/// Validates configuration blobs
pub trait Validator: Send + Sync + Debug {
    /// Validate `blob` in `mode`
    fn validate(&self, blob: &Blob, mode: ValidationMode) -> ValidationStatus;

    /// Whether this validator is backed by a schema
    fn are_schemas_supported(&self) -> bool;

    /// Schema builder, for validators backed by a schema
    fn schema_builder(&self) -> Option<&SchemaBuilder>;

    /// Validate before a write
    fn validate_strictly(&self, blob: &Blob) -> ValidationStatus {
        self.validate(blob, ValidationMode::Strict)
    }

    /// Validate stored data on read
    fn validate_permissively(&self, blob: &Blob) -> ValidationStatus {
        self.validate(blob, ValidationMode::Permissive)
    }

    /// Current schema version, if the schema is versioned
    fn schema_version(&self) -> Option<&str> {
        self.schema_builder().and_then(SchemaBuilder::version)
    }
}

/// Accepts everything; for providers without a schema
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopValidator;

impl NoopValidator {
    /// Create new validator instance
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Validator for NoopValidator {
    fn validate(&self, _blob: &Blob, _mode: ValidationMode) -> ValidationStatus {
        ValidationStatus::good()
    }

    fn are_schemas_supported(&self) -> bool {
        false
    }

    fn schema_builder(&self) -> Option<&SchemaBuilder> {
        None
    }
}
