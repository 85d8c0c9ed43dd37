//! JSON Schema backed validator
//!
//! Compiles the root schema document of the current schema version once and
//! maps every violation reported by `jsonschema` to a [`ValidationError`]
//! whose pointer resolves against the validated blob.

use crate::error::ValidatorError;
use crate::pointer;
use crate::status::{ValidationError, ValidationStatus};
use crate::validator::{ValidationMode, Validator};
use confset_schema::{Blob, SchemaBuilder, SchemaReader};
use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, JSONSchema};
use serde_json::{json, Value};
use std::fmt;

/// Validator for one schema, in its current version
pub struct JsonSchemaValidator {
    builder: SchemaBuilder,
    compiled: JSONSchema,
}

impl JsonSchemaValidator {
    /// Build and compile the schema read by `reader`
    ///
    /// # Errors
    /// - [`ValidatorError::Schema`] if the schema definition is malformed
    /// - [`ValidatorError::InvalidSchema`] if the document does not compile
    pub fn new(reader: SchemaReader) -> Result<Self, ValidatorError> {
        let builder = SchemaBuilder::new(reader);
        let document = builder.get_root_schema(None)?;
        let compiled = JSONSchema::options()
            .with_draft(draft_for(builder.reader().dialect()))
            .compile(&document)
            .map_err(|e| ValidatorError::InvalidSchema {
                schema_id: builder.reader().schema_id().to_string(),
                message: e.to_string(),
            })?;

        tracing::debug!(
            schema = builder.reader().schema_id(),
            version = builder.version().unwrap_or("unversioned"),
            "compiled JSON schema validator"
        );
        Ok(Self { builder, compiled })
    }

    /// Schema id this validator checks against
    #[inline]
    #[must_use]
    pub fn schema_id(&self) -> &str {
        self.builder.reader().schema_id()
    }
}

impl Validator for JsonSchemaValidator {
    fn validate(&self, blob: &Blob, mode: ValidationMode) -> ValidationStatus {
        let instance = Value::Object(blob.clone());
        let violations: Vec<ValidationError> = match self.compiled.validate(&instance) {
            Ok(()) => return ValidationStatus::good(),
            Err(errors) => errors.flat_map(to_validation_errors).collect(),
        };

        tracing::debug!(
            schema = self.schema_id(),
            ?mode,
            violation_count = violations.len(),
            "validation found violations"
        );
        match mode {
            ValidationMode::Strict => ValidationStatus::from_errors(violations),
            ValidationMode::Permissive => ValidationStatus::from_warnings(violations),
        }
    }

    fn are_schemas_supported(&self) -> bool {
        true
    }

    fn schema_builder(&self) -> Option<&SchemaBuilder> {
        Some(&self.builder)
    }
}

impl fmt::Debug for JsonSchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaValidator")
            .field("schema_id", &self.schema_id())
            .field("version", &self.builder.version())
            .finish_non_exhaustive()
    }
}

fn draft_for(dialect: &str) -> Draft {
    if dialect.contains("draft-04") {
        Draft::Draft4
    } else if dialect.contains("draft-06") {
        Draft::Draft6
    } else {
        Draft::Draft7
    }
}

/// One `jsonschema` error may name several offending properties
fn to_validation_errors(violation: jsonschema::ValidationError<'_>) -> Vec<ValidationError> {
    let location = violation.instance_path.clone().into_vec();
    let schema_path = violation.schema_path.to_string();
    let keyword = violation
        .schema_path
        .clone()
        .into_vec()
        .pop()
        .unwrap_or_default();
    let describe = |error: ValidationError| {
        error
            .with_data("keyword", json!(keyword))
            .with_data("schemaPath", json!(schema_path))
    };

    match &violation.kind {
        ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
            .iter()
            .map(|name| {
                let pointer = pointer::from_tokens(location.iter().chain([name]));
                describe(ValidationError::new(
                    pointer,
                    format!("unexpected property '{name}'"),
                ))
            })
            .collect(),
        ValidationErrorKind::Required { property } => {
            let missing = property.as_str().unwrap_or_default();
            let mut error = describe(
                ValidationError::new(pointer::from_tokens(&location), violation.to_string())
                    .with_data("missingProperty", property.clone()),
            );
            error.property = pointer::to_property_path(&pointer::from_tokens(
                location.iter().map(String::as_str).chain([missing]),
            ));
            vec![error]
        }
        _ => vec![describe(ValidationError::new(
            pointer::from_tokens(&location),
            violation.to_string(),
        ))],
    }
}
