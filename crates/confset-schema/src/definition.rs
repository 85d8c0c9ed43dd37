//! Declarative schema definitions
//!
//! A [`SchemaDefinition`] is one concrete version of a configuration schema.
//! Definitions are plain data: build them in code with the `with_*` methods
//! or load them from JSON/YAML documents.
//!
//! ```yaml
//! id: Example
//! version: 2.0.0
//! previousVersion: 1.0.0
//! converter: example-v2
//! properties:
//!   Timeout:
//!     type: object
//!     properties:
//!       Seconds: { type: integer, default: 30 }
//! required: [Timeout]
//! ```

use crate::error::SchemaError;
use crate::version::SchemaVersion;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// JSON Schema dialect emitted as `$schema` unless a definition overrides it
pub const DEFAULT_DIALECT: &str = "http://json-schema.org/draft-07/schema#";

/// Callback computing a default value at read time
pub type DynamicDefault = Arc<dyn Fn() -> Value + Send + Sync>;

/// One concrete schema version
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDefinition {
    /// Schema identifier, shared by every version of the schema
    pub id: String,

    /// Version of this definition (`None` for unversioned schemas)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Predecessor in the version chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_version: Option<String>,

    /// Successor in the version chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_version: Option<String>,

    /// Converter bridging the previous version to this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,

    /// `$schema` dialect URI
    #[serde(default = "default_dialect")]
    pub dialect: String,

    /// Top-level property fragments (JSON Schema objects)
    #[serde(default)]
    pub properties: Map<String, Value>,

    /// Names of required top-level properties
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(skip)]
    dynamic_defaults: BTreeMap<String, DynamicDefault>,
}

fn default_dialect() -> String {
    DEFAULT_DIALECT.to_string()
}

impl SchemaDefinition {
    /// Create an empty, unversioned definition
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: None,
            previous_version: None,
            next_version: None,
            converter: None,
            dialect: default_dialect(),
            properties: Map::new(),
            required: Vec::new(),
            dynamic_defaults: BTreeMap::new(),
        }
    }

    /// Parse a definition from JSON
    ///
    /// # Errors
    /// Returns [`SchemaError::Parse`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(json).map_err(|e| SchemaError::Parse(e.to_string()))
    }

    /// Parse a definition from YAML
    ///
    /// # Errors
    /// Returns [`SchemaError::Parse`] if the document is malformed.
    pub fn from_yaml(yaml: &str) -> Result<Self, SchemaError> {
        serde_yaml::from_str(yaml).map_err(|e| SchemaError::Parse(e.to_string()))
    }

    /// Set version
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set predecessor version
    #[must_use]
    pub fn with_previous_version(mut self, version: impl Into<String>) -> Self {
        self.previous_version = Some(version.into());
        self
    }

    /// Set successor version
    #[must_use]
    pub fn with_next_version(mut self, version: impl Into<String>) -> Self {
        self.next_version = Some(version.into());
        self
    }

    /// Set the converter id used to reach this version from its predecessor
    #[must_use]
    pub fn with_converter(mut self, converter_id: impl Into<String>) -> Self {
        self.converter = Some(converter_id.into());
        self
    }

    /// Override the `$schema` dialect
    #[must_use]
    pub fn with_dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialect = dialect.into();
        self
    }

    /// Declare an optional property
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, fragment: Value) -> Self {
        self.properties.insert(name.into(), fragment);
        self
    }

    /// Declare a required property
    #[must_use]
    pub fn with_required_property(mut self, name: impl Into<String>, fragment: Value) -> Self {
        let name = name.into();
        self.properties.insert(name.clone(), fragment);
        if !self.required.contains(&name) {
            self.required.push(name);
        }
        self
    }

    /// Attach a dynamic default to a declared property
    #[must_use]
    pub fn with_dynamic_default<F>(mut self, name: impl Into<String>, default: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.dynamic_defaults.insert(name.into(), Arc::new(default));
        self
    }

    /// Dynamic default for a property, if any
    #[inline]
    #[must_use]
    pub fn dynamic_default(&self, name: &str) -> Option<&DynamicDefault> {
        self.dynamic_defaults.get(name)
    }

    /// Parsed version, if the definition is versioned
    ///
    /// # Errors
    /// Returns an error if the declared version cannot be parsed.
    pub fn parsed_version(&self) -> Result<Option<SchemaVersion>, SchemaError> {
        self.version.as_deref().map(SchemaVersion::parse).transpose()
    }

    /// Check that the definition describes a usable schema
    ///
    /// # Errors
    /// Returns [`SchemaError::InvalidDefinition`] for malformed ids,
    /// non-object property fragments, undeclared required or dynamically
    /// defaulted properties, and version links on unversioned schemas.
    /// Returns [`SchemaError::InvalidVersion`] for unparsable versions.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if !is_valid_id(&self.id) {
            return Err(SchemaError::invalid_definition(
                &self.id,
                "ids must be non-empty and use only letters, digits, '_', '-', '.' or '/'",
            ));
        }

        let version = self.parsed_version()?;
        for linked in [&self.previous_version, &self.next_version].into_iter().flatten() {
            let linked = SchemaVersion::parse(linked)?;
            match &version {
                None => {
                    return Err(SchemaError::invalid_definition(
                        &self.id,
                        "version links require the definition itself to be versioned",
                    ))
                }
                Some(own) if *own == linked => {
                    return Err(SchemaError::invalid_definition(
                        &self.id,
                        format!("version {own} links to itself"),
                    ))
                }
                Some(_) => {}
            }
        }

        for (name, fragment) in &self.properties {
            if !fragment.is_object() {
                return Err(SchemaError::invalid_definition(
                    &self.id,
                    format!("property '{name}' must be a JSON Schema object"),
                ));
            }
        }

        let undeclared = self
            .required
            .iter()
            .chain(self.dynamic_defaults.keys())
            .find(|name| !self.properties.contains_key(name.as_str()));
        if let Some(name) = undeclared {
            return Err(SchemaError::invalid_definition(
                &self.id,
                format!("property '{name}' is referenced but not declared"),
            ));
        }

        Ok(())
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/'))
}

impl fmt::Debug for SchemaDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDefinition")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("previous_version", &self.previous_version)
            .field("next_version", &self.next_version)
            .field("converter", &self.converter)
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .field("required", &self.required)
            .field(
                "dynamic_defaults",
                &self.dynamic_defaults.keys().collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_sets_links() {
        let def = SchemaDefinition::new("Example")
            .with_version("2.0.0")
            .with_previous_version("1.0.0")
            .with_converter("example-v2")
            .with_required_property("Name", json!({"type": "string"}));

        assert_eq!(def.version.as_deref(), Some("2.0.0"));
        assert_eq!(def.previous_version.as_deref(), Some("1.0.0"));
        assert_eq!(def.converter.as_deref(), Some("example-v2"));
        assert_eq!(def.required, vec!["Name".to_string()]);
        assert!(def.validate().is_ok());
    }

    #[test]
    fn required_property_not_duplicated() {
        let def = SchemaDefinition::new("Example")
            .with_required_property("Name", json!({"type": "string"}))
            .with_required_property("Name", json!({"type": "string", "minLength": 1}));
        assert_eq!(def.required.len(), 1);
        assert_eq!(def.properties["Name"]["minLength"], json!(1));
    }

    #[test]
    fn from_yaml_document() {
        let yaml = r"
id: Example
version: 2.0.0
previousVersion: 1.0.0
converter: example-v2
properties:
  Timeout:
    type: object
    properties:
      Seconds: { type: integer, default: 30 }
required: [Timeout]
";
        let def = SchemaDefinition::from_yaml(yaml).unwrap();
        assert_eq!(def.id, "Example");
        assert_eq!(def.previous_version.as_deref(), Some("1.0.0"));
        assert_eq!(def.dialect, DEFAULT_DIALECT);
        assert_eq!(
            def.properties["Timeout"]["properties"]["Seconds"]["default"],
            json!(30)
        );
        assert!(def.validate().is_ok());
    }

    #[test]
    fn from_json_document() {
        let def = SchemaDefinition::from_json(
            r#"{"id": "Example", "version": "1.0.0", "properties": {"Flag": {"type": "boolean"}}}"#,
        )
        .unwrap();
        assert!(def.properties.contains_key("Flag"));
        assert!(def.required.is_empty());
    }

    #[test]
    fn from_json_rejects_garbage() {
        let err = SchemaDefinition::from_json("{not json").unwrap_err();
        assert!(matches!(err, SchemaError::Parse(_)));
    }

    #[test]
    fn validate_rejects_undeclared_required() {
        let mut def = SchemaDefinition::new("Example").with_version("1.0.0");
        def.required.push("Missing".to_string());
        assert!(matches!(
            def.validate().unwrap_err(),
            SchemaError::InvalidDefinition { .. }
        ));
    }

    #[test]
    fn validate_rejects_non_object_fragment() {
        let def = SchemaDefinition::new("Example").with_property("Bad", json!("string"));
        assert!(def.validate().is_err());
    }

    #[test]
    fn validate_rejects_links_without_version() {
        let def = SchemaDefinition::new("Example").with_next_version("2.0.0");
        assert!(def.validate().is_err());
    }

    #[test]
    fn validate_rejects_self_link() {
        let def = SchemaDefinition::new("Example")
            .with_version("1.0.0")
            .with_next_version("1.0");
        assert!(def.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_id() {
        assert!(SchemaDefinition::new("").validate().is_err());
        assert!(SchemaDefinition::new("has space").validate().is_err());
        assert!(SchemaDefinition::new("ext/Growth-1.x").validate().is_ok());
    }

    #[test]
    fn dynamic_default_must_be_declared() {
        let def = SchemaDefinition::new("Example").with_dynamic_default("Ghost", || json!(1));
        assert!(def.validate().is_err());
    }

    #[test]
    fn dynamic_default_is_invoked() {
        let def = SchemaDefinition::new("Example")
            .with_property("Now", json!({"type": "integer"}))
            .with_dynamic_default("Now", || json!(42));
        let default = def.dynamic_default("Now").unwrap();
        assert_eq!(default(), json!(42));
    }
}
