//! Schema readers and version resolution

use crate::definition::SchemaDefinition;
use crate::error::SchemaError;
use crate::registry::SchemaRegistry;
use crate::version::SchemaVersion;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Read access to one schema version
///
/// Cheap to clone; holds the definition and a handle to the registry it
/// was resolved from.
#[derive(Debug, Clone)]
pub struct SchemaReader {
    definition: Arc<SchemaDefinition>,
    registry: Arc<SchemaRegistry>,
}

impl SchemaReader {
    pub(crate) fn new(definition: Arc<SchemaDefinition>, registry: Arc<SchemaRegistry>) -> Self {
        Self {
            definition,
            registry,
        }
    }

    /// Schema identifier
    #[inline]
    #[must_use]
    pub fn schema_id(&self) -> &str {
        &self.definition.id
    }

    /// Version of this definition
    #[inline]
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.definition.version.as_deref()
    }

    /// Successor version
    #[inline]
    #[must_use]
    pub fn next_version(&self) -> Option<&str> {
        self.definition.next_version.as_deref()
    }

    /// Predecessor version
    #[inline]
    #[must_use]
    pub fn previous_version(&self) -> Option<&str> {
        self.definition.previous_version.as_deref()
    }

    /// Converter bridging the predecessor to this version
    #[inline]
    #[must_use]
    pub fn schema_converter_id(&self) -> Option<&str> {
        self.definition.converter.as_deref()
    }

    /// `$schema` dialect URI
    #[inline]
    #[must_use]
    pub fn dialect(&self) -> &str {
        &self.definition.dialect
    }

    /// Declared top-level property fragments
    #[inline]
    #[must_use]
    pub fn properties(&self) -> &Map<String, Value> {
        &self.definition.properties
    }

    /// Required top-level property names
    #[inline]
    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.definition.required
    }

    /// Underlying definition
    #[inline]
    #[must_use]
    pub fn definition(&self) -> &SchemaDefinition {
        &self.definition
    }

    /// Registry this reader was resolved from
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Version manager for this schema
    #[inline]
    #[must_use]
    pub fn version_manager(&self) -> SchemaVersionManager {
        SchemaVersionManager::new(self.clone())
    }
}

/// Resolves sibling versions of a schema
#[derive(Debug, Clone)]
pub struct SchemaVersionManager {
    reader: SchemaReader,
}

impl SchemaVersionManager {
    /// Create manager anchored at `reader`
    #[inline]
    #[must_use]
    pub fn new(reader: SchemaReader) -> Self {
        Self { reader }
    }

    /// Reader for `version` of the anchored schema
    ///
    /// Returns the anchor itself when `version` is its own version.
    ///
    /// # Errors
    /// - [`SchemaError::NotVersioned`] if the schema has no version
    /// - [`SchemaError::VersionNotFound`] if no sibling carries `version`
    pub fn get_version_for_schema(&self, version: &str) -> Result<SchemaReader, SchemaError> {
        let own = self
            .reader
            .definition
            .parsed_version()?
            .ok_or_else(|| SchemaError::NotVersioned(self.reader.schema_id().to_string()))?;

        if own == SchemaVersion::parse(version)? {
            return Ok(self.reader.clone());
        }
        self.reader
            .registry
            .reader_for_version(self.reader.schema_id(), version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chain() -> Arc<SchemaRegistry> {
        let mut registry = SchemaRegistry::new();
        registry
            .register_all([
                SchemaDefinition::new("Example")
                    .with_version("1.0.0")
                    .with_next_version("2.0.0")
                    .with_property("Old", json!({"type": "string"})),
                SchemaDefinition::new("Example")
                    .with_version("2.0.0")
                    .with_previous_version("1.0.0")
                    .with_converter("example-v2")
                    .with_property("New", json!({"type": "string"})),
            ])
            .unwrap();
        Arc::new(registry)
    }

    #[test]
    fn reader_accessors() {
        let reader = chain().reader("Example").unwrap();
        assert_eq!(reader.schema_id(), "Example");
        assert_eq!(reader.version(), Some("2.0.0"));
        assert_eq!(reader.previous_version(), Some("1.0.0"));
        assert_eq!(reader.next_version(), None);
        assert_eq!(reader.schema_converter_id(), Some("example-v2"));
        assert!(reader.properties().contains_key("New"));
    }

    #[test]
    fn own_version_returns_self() {
        let reader = chain().reader("Example").unwrap();
        let same = reader.version_manager().get_version_for_schema("2.0").unwrap();
        assert_eq!(same.version(), Some("2.0.0"));
        assert!(Arc::ptr_eq(&same.definition, &reader.definition));
    }

    #[test]
    fn sibling_version_resolved() {
        let reader = chain().reader("Example").unwrap();
        let older = reader.version_manager().get_version_for_schema("1.0.0").unwrap();
        assert_eq!(older.version(), Some("1.0.0"));
        assert_eq!(older.next_version(), Some("2.0.0"));
        assert!(older.properties().contains_key("Old"));
    }

    #[test]
    fn missing_sibling_errors() {
        let reader = chain().reader("Example").unwrap();
        let err = reader.version_manager().get_version_for_schema("0.5.0").unwrap_err();
        assert!(matches!(err, SchemaError::VersionNotFound { .. }));
    }

    #[test]
    fn unversioned_schema_cannot_resolve() {
        let mut registry = SchemaRegistry::new();
        registry.register(SchemaDefinition::new("Plain")).unwrap();
        let reader = Arc::new(registry).reader("Plain").unwrap();
        assert_eq!(
            reader.version_manager().get_version_for_schema("1.0.0").unwrap_err(),
            SchemaError::NotVersioned("Plain".to_string())
        );
    }
}
