//! Error types for the schema layer

/// Errors raised while declaring, registering or resolving schemas
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// Version string could not be ordered
    #[error("invalid schema version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// No schema registered under the id
    #[error("unknown schema: '{0}'")]
    UnknownSchema(String),

    /// The schema exists but not in the requested version
    #[error("schema '{schema_id}' has no definition for version {version}")]
    VersionNotFound { schema_id: String, version: String },

    /// Version-dependent operation on a schema without a version
    #[error("schema '{0}' is not versioned")]
    NotVersioned(String),

    /// Two definitions claim the same id and version
    #[error("schema '{schema_id}' already registers version {version}")]
    DuplicateVersion { schema_id: String, version: String },

    /// Definition does not describe a usable schema
    #[error("invalid schema definition '{schema_id}': {reason}")]
    InvalidDefinition { schema_id: String, reason: String },

    /// Serialized definition could not be parsed
    #[error("failed to parse schema definition: {0}")]
    Parse(String),
}

impl SchemaError {
    /// Create invalid version error
    pub fn invalid_version(version: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.into(),
            reason: reason.into(),
        }
    }

    /// Create invalid definition error
    pub fn invalid_definition(schema_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            schema_id: schema_id.into(),
            reason: reason.into(),
        }
    }

    /// Create version not found error
    pub fn version_not_found(schema_id: impl Into<String>, version: impl Into<String>) -> Self {
        Self::VersionNotFound {
            schema_id: schema_id.into(),
            version: version.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_not_found_display() {
        let err = SchemaError::version_not_found("Example", "2.0.0");
        assert_eq!(
            err.to_string(),
            "schema 'Example' has no definition for version 2.0.0"
        );
    }

    #[test]
    fn invalid_definition_display() {
        let err = SchemaError::invalid_definition("Example", "required property 'x' is not declared");
        assert!(err.to_string().contains("required property 'x'"));
    }
}
