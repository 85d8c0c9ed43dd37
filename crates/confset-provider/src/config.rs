//! Factory configuration
//!
//! Declares which providers exist and which store and validator each one is
//! built from. Loadable from TOML or YAML:
//!
//! ```toml
//! [cache]
//! shared_ttl_secs = 3600
//!
//! [providers.Example.store]
//! type = "file"
//! args = { path = "config/example.json" }
//!
//! [providers.Example.validator]
//! type = "jsonschema"
//! args = { schema = "Example" }
//! ```

use crate::error::FactoryError;
use confset_store::CacheConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Store or validator selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComponentConfig {
    /// Registered type name
    #[serde(rename = "type")]
    pub type_name: String,
    /// Constructor arguments, interpreted by the type
    #[serde(default)]
    pub args: Value,
}

impl ComponentConfig {
    /// Create component of `type_name` without arguments
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            args: Value::Null,
        }
    }

    /// With constructor arguments
    #[must_use]
    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }
}

fn default_validator() -> ComponentConfig {
    ComponentConfig::new("noop")
}

/// One provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProviderConfig {
    /// Where the configuration is stored
    pub store: ComponentConfig,
    /// How it is validated; schemaless when omitted
    #[serde(default = "default_validator")]
    pub validator: ComponentConfig,
}

impl ProviderConfig {
    /// Create provider config over `store` with no schema
    #[must_use]
    pub fn new(store: ComponentConfig) -> Self {
        Self {
            store,
            validator: default_validator(),
        }
    }

    /// With validator
    #[must_use]
    pub fn with_validator(mut self, validator: ComponentConfig) -> Self {
        self.validator = validator;
        self
    }
}

/// Providers to build, keyed by provider id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FactoryConfig {
    /// Cache settings shared by every caching store
    pub cache: CacheConfig,
    /// Provider declarations
    pub providers: BTreeMap<String, ProviderConfig>,
}

impl FactoryConfig {
    /// Create empty configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With cache settings
    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// With provider
    #[must_use]
    pub fn with_provider(mut self, id: impl Into<String>, provider: ProviderConfig) -> Self {
        self.providers.insert(id.into(), provider);
        self
    }

    /// Parse TOML document
    ///
    /// # Errors
    /// Returns [`FactoryError::Config`] if the document does not parse.
    pub fn from_toml(source: &str) -> Result<Self, FactoryError> {
        toml::from_str(source).map_err(|e| FactoryError::Config(e.to_string()))
    }

    /// Parse YAML document
    ///
    /// # Errors
    /// Returns [`FactoryError::Config`] if the document does not parse.
    pub fn from_yaml(source: &str) -> Result<Self, FactoryError> {
        serde_yaml::from_str(source).map_err(|e| FactoryError::Config(e.to_string()))
    }

    /// JSON Schema of this configuration format
    #[must_use]
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(FactoryConfig)
    }
}
