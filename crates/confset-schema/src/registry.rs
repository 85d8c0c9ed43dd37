//! Schema registry keyed by schema id and version
//!
//! Populated once at startup, then shared behind an [`Arc`]. Every
//! [`SchemaReader`] keeps a handle to the registry so sibling versions can be
//! resolved without global state.

use crate::definition::SchemaDefinition;
use crate::error::SchemaError;
use crate::reader::SchemaReader;
use crate::version::SchemaVersion;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// All definitions of one schema id
#[derive(Debug, Clone, Default)]
struct SchemaFamily {
    versions: BTreeMap<SchemaVersion, Arc<SchemaDefinition>>,
    unversioned: Option<Arc<SchemaDefinition>>,
}

impl SchemaFamily {
    fn current(&self) -> Option<&Arc<SchemaDefinition>> {
        self.unversioned
            .as_ref()
            .or_else(|| self.versions.values().next_back())
    }
}

/// Registry of schema definitions
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, SchemaFamily>,
}

impl SchemaRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition
    ///
    /// A schema id holds either one unversioned definition or any number of
    /// versioned ones. The highest registered version is the current one.
    ///
    /// # Errors
    /// - [`SchemaError::InvalidDefinition`] if the definition is malformed
    ///   or mixes versioned and unversioned definitions under one id
    /// - [`SchemaError::DuplicateVersion`] if the version is already taken
    pub fn register(&mut self, definition: SchemaDefinition) -> Result<(), SchemaError> {
        definition.validate()?;
        let version = definition.parsed_version()?;
        let family = self.schemas.entry(definition.id.clone()).or_default();

        match version {
            None if family.unversioned.is_none() && family.versions.is_empty() => {
                family.unversioned = Some(Arc::new(definition));
            }
            None => {
                return Err(SchemaError::invalid_definition(
                    &definition.id,
                    "an unversioned definition cannot share its id",
                ));
            }
            Some(_) if family.unversioned.is_some() => {
                return Err(SchemaError::invalid_definition(
                    &definition.id,
                    "id already holds an unversioned definition",
                ));
            }
            Some(version) => {
                if family.versions.contains_key(&version) {
                    return Err(SchemaError::DuplicateVersion {
                        schema_id: definition.id.clone(),
                        version: version.to_string(),
                    });
                }
                tracing::debug!(schema = %definition.id, %version, "registered schema version");
                family.versions.insert(version, Arc::new(definition));
            }
        }
        Ok(())
    }

    /// Register several definitions, stopping at the first error
    ///
    /// # Errors
    /// See [`SchemaRegistry::register`].
    pub fn register_all(
        &mut self,
        definitions: impl IntoIterator<Item = SchemaDefinition>,
    ) -> Result<(), SchemaError> {
        definitions.into_iter().try_for_each(|def| self.register(def))
    }

    /// Reader for the current version of a schema
    ///
    /// # Errors
    /// Returns [`SchemaError::UnknownSchema`] if nothing is registered under `id`.
    pub fn reader(self: &Arc<Self>, id: &str) -> Result<SchemaReader, SchemaError> {
        let definition = self
            .schemas
            .get(id)
            .and_then(SchemaFamily::current)
            .ok_or_else(|| SchemaError::UnknownSchema(id.to_string()))?;
        Ok(SchemaReader::new(Arc::clone(definition), Arc::clone(self)))
    }

    /// Reader for a specific version of a schema
    ///
    /// # Errors
    /// - [`SchemaError::UnknownSchema`] if nothing is registered under `id`
    /// - [`SchemaError::VersionNotFound`] if the version is not registered
    /// - [`SchemaError::InvalidVersion`] if `version` cannot be parsed
    pub fn reader_for_version(
        self: &Arc<Self>,
        id: &str,
        version: &str,
    ) -> Result<SchemaReader, SchemaError> {
        let family = self
            .schemas
            .get(id)
            .ok_or_else(|| SchemaError::UnknownSchema(id.to_string()))?;
        let parsed = SchemaVersion::parse(version)?;
        let definition = family
            .versions
            .get(&parsed)
            .ok_or_else(|| SchemaError::version_not_found(id, version))?;
        Ok(SchemaReader::new(Arc::clone(definition), Arc::clone(self)))
    }

    /// Registered versions of a schema, ascending
    #[must_use]
    pub fn versions(&self, id: &str) -> Vec<&SchemaVersion> {
        self.schemas
            .get(id)
            .map(|family| family.versions.keys().collect())
            .unwrap_or_default()
    }

    /// Check if a schema id is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.schemas.contains_key(id)
    }

    /// All registered schema ids
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.schemas.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered schema ids
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn versioned(version: &str) -> SchemaDefinition {
        SchemaDefinition::new("Example")
            .with_version(version)
            .with_property("Value", json!({"type": "integer"}))
    }

    #[test]
    fn registry_new_empty() {
        let registry = SchemaRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn current_is_highest_version() {
        let mut registry = SchemaRegistry::new();
        registry
            .register_all([versioned("2.0.0"), versioned("10.0.0"), versioned("1.0.0")])
            .unwrap();
        let registry = Arc::new(registry);

        let reader = registry.reader("Example").unwrap();
        assert_eq!(reader.version(), Some("10.0.0"));
        assert_eq!(registry.versions("Example").len(), 3);
    }

    #[test]
    fn reader_for_version_uses_version_ordering() {
        let mut registry = SchemaRegistry::new();
        registry.register(versioned("1.0.0")).unwrap();
        let registry = Arc::new(registry);

        let reader = registry.reader_for_version("Example", "1.0").unwrap();
        assert_eq!(reader.version(), Some("1.0.0"));
        assert!(matches!(
            registry.reader_for_version("Example", "3.0.0").unwrap_err(),
            SchemaError::VersionNotFound { .. }
        ));
    }

    #[test]
    fn duplicate_version_rejected() {
        let mut registry = SchemaRegistry::new();
        registry.register(versioned("1.0.0")).unwrap();
        let err = registry.register(versioned("1.0")).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateVersion { .. }));
    }

    #[test]
    fn unversioned_cannot_mix() {
        let mut registry = SchemaRegistry::new();
        registry.register(SchemaDefinition::new("Example")).unwrap();
        assert!(registry.register(versioned("1.0.0")).is_err());
        assert!(registry.register(SchemaDefinition::new("Example")).is_err());
    }

    #[test]
    fn unknown_schema() {
        let registry = Arc::new(SchemaRegistry::new());
        assert_eq!(
            registry.reader("Nope").unwrap_err(),
            SchemaError::UnknownSchema("Nope".to_string())
        );
    }

    #[test]
    fn ids_sorted() {
        let mut registry = SchemaRegistry::new();
        registry.register(SchemaDefinition::new("b")).unwrap();
        registry.register(SchemaDefinition::new("a")).unwrap();
        assert_eq!(registry.ids(), vec!["a", "b"]);
        assert!(registry.contains("a"));
    }
}
