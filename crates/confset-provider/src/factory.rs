//! Provider factory and registry
//!
//! The factory maps store and validator type names to constructor closures.
//! Hosts register their own types at startup; building a [`FactoryConfig`]
//! yields a [`ProviderRegistry`] that owns every configured provider.

use crate::config::FactoryConfig;
use crate::error::FactoryError;
use crate::provider::ConfigurationProvider;
use confset_schema::{Blob, SchemaConverterFactory, SchemaRegistry};
use confset_store::{
    CacheConfig, CachingStore, ConfigurationStore, FileBackend, MokaSharedCache, SharedCache,
    StaticStore,
};
use confset_validation::{JsonSchemaValidator, NoopValidator, Validator};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared services handed to store constructors
#[derive(Debug, Clone)]
pub struct StoreContext {
    /// Shared cache tier
    pub shared_cache: Arc<dyn SharedCache>,
    /// Cache settings
    pub cache: CacheConfig,
}

/// Store constructor registered under a type name
pub type StoreConstructor = Arc<
    dyn Fn(&StoreContext, &Value) -> Result<Arc<dyn ConfigurationStore>, FactoryError> + Send + Sync,
>;

/// Validator constructor registered under a type name
pub type ValidatorConstructor = Arc<
    dyn Fn(&Arc<SchemaRegistry>, &Value) -> Result<Arc<dyn Validator>, FactoryError> + Send + Sync,
>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StaticStoreArgs {
    #[serde(default)]
    config: Blob,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileStoreArgs {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonSchemaArgs {
    schema: String,
}

/// Parse constructor arguments; `null` reads as an empty object
///
/// # Errors
/// Returns [`FactoryError::InvalidArgs`] if `args` does not fit `T`.
pub fn parse_args<T: DeserializeOwned>(type_name: &str, args: &Value) -> Result<T, FactoryError> {
    let args = match args {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(args).map_err(|e| FactoryError::invalid_args(type_name, e))
}

/// Builds providers from configuration
pub struct ProviderFactory {
    schemas: Arc<SchemaRegistry>,
    converters: Arc<SchemaConverterFactory>,
    shared_cache: Arc<dyn SharedCache>,
    stores: HashMap<String, StoreConstructor>,
    validators: HashMap<String, ValidatorConstructor>,
}

impl ProviderFactory {
    /// Create factory with the built-in types
    ///
    /// Stores: `static`, `file`. Validators: `noop`, `jsonschema`.
    #[must_use]
    pub fn new(schemas: Arc<SchemaRegistry>, converters: Arc<SchemaConverterFactory>) -> Self {
        let mut factory = Self {
            schemas,
            converters,
            shared_cache: Arc::new(MokaSharedCache::default()),
            stores: HashMap::new(),
            validators: HashMap::new(),
        };

        factory.register_store("static", |_, args| {
            let args: StaticStoreArgs = parse_args("static", args)?;
            let store = StaticStore::new(&args.config, args.version.as_deref())?;
            Ok(Arc::new(store) as Arc<dyn ConfigurationStore>)
        });
        factory.register_store("file", |context, args| {
            let args: FileStoreArgs = parse_args("file", args)?;
            Ok(Arc::new(CachingStore::new(
                FileBackend::new(args.path),
                Arc::clone(&context.shared_cache),
                context.cache.clone(),
            )) as Arc<dyn ConfigurationStore>)
        });
        factory.register_validator("noop", |_, _| {
            Ok(Arc::new(NoopValidator::new()) as Arc<dyn Validator>)
        });
        factory.register_validator("jsonschema", |schemas, args| {
            let args: JsonSchemaArgs = parse_args("jsonschema", args)?;
            let validator = JsonSchemaValidator::new(schemas.reader(&args.schema)?)?;
            Ok(Arc::new(validator) as Arc<dyn Validator>)
        });
        factory
    }

    /// With shared cache tier
    #[must_use]
    pub fn with_shared_cache(mut self, shared_cache: Arc<dyn SharedCache>) -> Self {
        self.shared_cache = shared_cache;
        self
    }

    /// Register a store type, replacing any previous constructor
    pub fn register_store<F>(&mut self, type_name: impl Into<String>, constructor: F)
    where
        F: Fn(&StoreContext, &Value) -> Result<Arc<dyn ConfigurationStore>, FactoryError>
            + Send
            + Sync
            + 'static,
    {
        self.stores.insert(type_name.into(), Arc::new(constructor));
    }

    /// Register a validator type, replacing any previous constructor
    pub fn register_validator<F>(&mut self, type_name: impl Into<String>, constructor: F)
    where
        F: Fn(&Arc<SchemaRegistry>, &Value) -> Result<Arc<dyn Validator>, FactoryError>
            + Send
            + Sync
            + 'static,
    {
        self.validators.insert(type_name.into(), Arc::new(constructor));
    }

    /// Registered store type names, sorted
    #[must_use]
    pub fn store_types(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.stores.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered validator type names, sorted
    #[must_use]
    pub fn validator_types(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.validators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build every provider declared in `config`
    ///
    /// # Errors
    /// Fails on the first provider whose store or validator cannot be built.
    pub fn build(&self, config: &FactoryConfig) -> Result<ProviderRegistry, FactoryError> {
        let context = StoreContext {
            shared_cache: Arc::clone(&self.shared_cache),
            cache: config.cache.clone(),
        };

        let mut providers = BTreeMap::new();
        for (id, declaration) in &config.providers {
            let store_type = &declaration.store.type_name;
            let build_store = self
                .stores
                .get(store_type)
                .ok_or_else(|| FactoryError::UnknownStoreType(store_type.clone()))?;
            let store = build_store(&context, &declaration.store.args)?;

            let validator_type = &declaration.validator.type_name;
            let build_validator = self
                .validators
                .get(validator_type)
                .ok_or_else(|| FactoryError::UnknownValidatorType(validator_type.clone()))?;
            let validator = build_validator(&self.schemas, &declaration.validator.args)?;

            let provider = ConfigurationProvider::new(id.clone(), store, validator)
                .with_converters(Arc::clone(&self.converters));
            tracing::debug!(
                provider = %id,
                store = %store_type,
                validator = %validator_type,
                "built provider"
            );
            providers.insert(id.clone(), Arc::new(provider));
        }
        Ok(ProviderRegistry { providers })
    }
}

impl fmt::Debug for ProviderFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderFactory")
            .field("schemas", &self.schemas.ids())
            .field("store_types", &self.store_types())
            .field("validator_types", &self.validator_types())
            .finish_non_exhaustive()
    }
}

/// Providers built by a [`ProviderFactory`], keyed by id
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<ConfigurationProvider>>,
}

impl ProviderRegistry {
    /// Provider registered under `id`
    ///
    /// # Errors
    /// Returns [`FactoryError::UnknownProvider`] if no provider has that id.
    pub fn get(&self, id: &str) -> Result<Arc<ConfigurationProvider>, FactoryError> {
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| FactoryError::UnknownProvider(id.to_string()))
    }

    /// Add or replace a provider
    pub fn insert(&mut self, provider: ConfigurationProvider) {
        self.providers
            .insert(provider.id().to_string(), Arc::new(provider));
    }

    /// Provider ids, sorted
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// Number of providers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// No providers
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Change notification for `location`
    ///
    /// Invalidates every provider whose store is bound to `location` and
    /// returns how many were invalidated.
    pub async fn invalidate_location(&self, location: &str) -> usize {
        let mut invalidated = 0;
        for provider in self.providers.values() {
            if provider.store().location() == Some(location) {
                provider.invalidate().await;
                invalidated += 1;
            }
        }
        tracing::debug!(location, invalidated, "processed change notification");
        invalidated
    }
}
