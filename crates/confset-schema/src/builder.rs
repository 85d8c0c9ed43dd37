//! Wire-format schema documents and defaults maps
//!
//! [`SchemaBuilder`] turns a [`SchemaReader`] into the JSON Schema document
//! served to editors and validators, and computes the default value of every
//! top-level property.

use crate::error::SchemaError;
use crate::reader::SchemaReader;
use crate::Blob;
use serde_json::{json, Map, Value};

/// Base URI of emitted `$id` values
pub const SCHEMA_ID_BASE: &str = "https://schemas.confset.dev/";

/// Builds schema documents and defaults for one schema
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    reader: SchemaReader,
}

impl SchemaBuilder {
    /// Create builder over `reader` (normally the current version)
    #[inline]
    #[must_use]
    pub fn new(reader: SchemaReader) -> Self {
        Self { reader }
    }

    /// Reader this builder is anchored at
    #[inline]
    #[must_use]
    pub fn reader(&self) -> &SchemaReader {
        &self.reader
    }

    /// Version of the anchored reader
    #[inline]
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.reader.version()
    }

    /// Root JSON Schema document for `version` (or the anchored version)
    ///
    /// The document is always closed: `additionalProperties` is `false`.
    ///
    /// # Errors
    /// - [`SchemaError::VersionNotFound`] if `version` is not registered
    /// - [`SchemaError::InvalidDefinition`] if the definition is malformed
    pub fn get_root_schema(&self, version: Option<&str>) -> Result<Value, SchemaError> {
        let reader = self.resolve(version)?;
        reader.definition().validate()?;

        let mut schema = Map::new();
        schema.insert("$schema".into(), json!(reader.dialect()));
        schema.insert("$id".into(), json!(schema_uri(&reader)));
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(reader.properties().clone()));
        schema.insert("additionalProperties".into(), Value::Bool(false));
        if !reader.required().is_empty() {
            schema.insert("required".into(), json!(reader.required()));
        }
        Ok(Value::Object(schema))
    }

    /// Default value of every top-level property that has one
    ///
    /// With `use_dynamic_defaults`, a property's dynamic default wins over
    /// its static `default`. Object-typed properties are filled field by
    /// field from their children's defaults.
    ///
    /// # Errors
    /// Returns [`SchemaError::VersionNotFound`] if `version` is not registered.
    pub fn get_defaults_map(
        &self,
        version: Option<&str>,
        use_dynamic_defaults: bool,
    ) -> Result<Blob, SchemaError> {
        let reader = self.resolve(version)?;
        let definition = reader.definition();

        let mut defaults = Blob::new();
        for (name, fragment) in reader.properties() {
            let dynamic = use_dynamic_defaults
                .then(|| definition.dynamic_default(name))
                .flatten();
            let value = match dynamic {
                Some(compute) => Some(compute()),
                None => resolve_default(fragment),
            };
            if let Some(value) = value {
                defaults.insert(name.clone(), value);
            }
        }
        Ok(defaults)
    }

    fn resolve(&self, version: Option<&str>) -> Result<SchemaReader, SchemaError> {
        match version {
            None => Ok(self.reader.clone()),
            Some(version) => self.reader.version_manager().get_version_for_schema(version),
        }
    }
}

fn schema_uri(reader: &SchemaReader) -> String {
    match reader.version() {
        Some(version) => format!("{SCHEMA_ID_BASE}{}/{version}", reader.schema_id()),
        None => format!("{SCHEMA_ID_BASE}{}", reader.schema_id()),
    }
}

fn is_object_schema(fragment: &Value) -> bool {
    fragment.get("type").and_then(Value::as_str) == Some("object")
        || (fragment.get("type").is_none() && fragment.get("properties").is_some())
}

enum Step<'a> {
    Visit {
        schema: &'a Value,
        key: Option<&'a str>,
    },
    Assemble {
        schema: &'a Value,
        key: Option<&'a str>,
        children: usize,
    },
}

/// Default of one schema fragment, walking nested objects with an explicit stack
///
/// A static `default` on an object wins key by key; children only fill the
/// keys it leaves out. Objects with neither a static default nor any
/// defaulted child have no default.
fn resolve_default(fragment: &Value) -> Option<Value> {
    let mut steps = vec![Step::Visit {
        schema: fragment,
        key: None,
    }];
    let mut resolved: Vec<(Option<&str>, Option<Value>)> = Vec::new();

    while let Some(step) = steps.pop() {
        match step {
            Step::Visit { schema, key } => {
                let nested = schema
                    .get("properties")
                    .and_then(Value::as_object)
                    .filter(|_| is_object_schema(schema));
                let static_is_object = schema.get("default").map_or(true, Value::is_object);

                match nested {
                    Some(properties) if static_is_object => {
                        steps.push(Step::Assemble {
                            schema,
                            key,
                            children: properties.len(),
                        });
                        for (name, child) in properties {
                            steps.push(Step::Visit {
                                schema: child,
                                key: Some(name.as_str()),
                            });
                        }
                    }
                    _ => resolved.push((key, schema.get("default").cloned())),
                }
            }
            Step::Assemble {
                schema,
                key,
                children,
            } => {
                let child_defaults = resolved.split_off(resolved.len() - children);
                let static_default = schema.get("default").and_then(Value::as_object);
                let mut object = static_default.cloned().unwrap_or_default();
                let mut filled = false;
                for (name, value) in child_defaults {
                    if let (Some(name), Some(value)) = (name, value) {
                        filled = true;
                        object.entry(name).or_insert(value);
                    }
                }
                let value = (static_default.is_some() || filled).then_some(Value::Object(object));
                resolved.push((key, value));
            }
        }
    }

    resolved.pop().and_then(|(_, value)| value)
}
