//! Configuration provider
//!
//! A provider composes one store and one validator. Reads fill in schema
//! defaults for missing top-level properties and validate permissively;
//! writes validate strictly and never reach the store when invalid.

use crate::error::{ProviderError, Result};
use crate::migrator::SchemaMigrator;
use confset_schema::{Blob, SchemaBuilder, SchemaConverterFactory, SchemaReader, SchemaVersion};
use confset_store::{Actor, ConfigurationStore};
use confset_validation::Validator;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;

/// Single entry point for reading and writing one configuration blob
#[derive(Debug, Clone)]
pub struct ConfigurationProvider {
    id: String,
    store: Arc<dyn ConfigurationStore>,
    validator: Arc<dyn Validator>,
    migrator: SchemaMigrator,
}

impl ConfigurationProvider {
    /// Create provider without converters
    pub fn new(
        id: impl Into<String>,
        store: Arc<dyn ConfigurationStore>,
        validator: Arc<dyn Validator>,
    ) -> Self {
        Self {
            id: id.into(),
            store,
            validator,
            migrator: SchemaMigrator::new(Arc::new(SchemaConverterFactory::new())),
        }
    }

    /// With migrator used by [`migrate_to_version`](Self::migrate_to_version)
    #[must_use]
    pub fn with_migrator(mut self, migrator: SchemaMigrator) -> Self {
        self.migrator = migrator;
        self
    }

    /// With converters for migrations
    #[must_use]
    pub fn with_converters(self, converters: Arc<SchemaConverterFactory>) -> Self {
        self.with_migrator(SchemaMigrator::new(converters))
    }

    /// Provider id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Backing store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ConfigurationStore> {
        &self.store
    }

    /// Validator
    #[inline]
    #[must_use]
    pub fn validator(&self) -> &Arc<dyn Validator> {
        &self.validator
    }

    /// Schema builder of the validator
    ///
    /// # Errors
    /// Returns [`ProviderError::SchemaNotSupported`] for schemaless validators.
    pub fn schema_builder(&self) -> Result<&SchemaBuilder> {
        match self.validator.schema_builder() {
            Some(builder) if self.validator.are_schemas_supported() => Ok(builder),
            _ => Err(ProviderError::SchemaNotSupported {
                provider: self.id.clone(),
            }),
        }
    }

    /// Reader of the current schema version
    ///
    /// # Errors
    /// Returns [`ProviderError::SchemaNotSupported`] for schemaless validators.
    pub fn schema_reader(&self) -> Result<&SchemaReader> {
        self.schema_builder().map(SchemaBuilder::reader)
    }

    /// Root schema document of `version`, or of the current version
    ///
    /// # Errors
    /// - [`ProviderError::SchemaNotSupported`] for schemaless validators
    /// - [`ProviderError::Schema`] if `version` is not registered
    pub fn get_schema(&self, version: Option<&str>) -> Result<Value> {
        Ok(self.schema_builder()?.get_root_schema(version)?)
    }

    /// Defaults of `version`, or of the current version
    ///
    /// # Errors
    /// - [`ProviderError::SchemaNotSupported`] for schemaless validators
    /// - [`ProviderError::Schema`] if `version` is not registered
    pub fn get_defaults(&self, version: Option<&str>) -> Result<Blob> {
        Ok(self.schema_builder()?.get_defaults_map(version, true)?)
    }

    /// Load, default and permissively validate the configuration
    ///
    /// # Errors
    /// - [`ProviderError::Store`] if the store cannot be read or decoded
    /// - [`ProviderError::ValidationFailed`] if validation is still fatal
    pub async fn load_valid_configuration(&self) -> Result<Blob> {
        let blob = self.store.load().await?;
        self.finish_load(blob)
    }

    /// Same as [`load_valid_configuration`](Self::load_valid_configuration),
    /// bypassing store caches
    ///
    /// # Errors
    /// See [`load_valid_configuration`](Self::load_valid_configuration).
    pub async fn load_valid_configuration_uncached(&self) -> Result<Blob> {
        let blob = self.store.load_uncached().await?;
        self.finish_load(blob)
    }

    fn finish_load(&self, mut blob: Blob) -> Result<Blob> {
        if let Ok(builder) = self.schema_builder() {
            for (name, default) in builder.get_defaults_map(None, true)? {
                blob.entry(name).or_insert(default);
            }
        }

        let status = self.validator.validate_permissively(&blob);
        if status.is_fatal() {
            return Err(ProviderError::ValidationFailed(status));
        }
        for warning in status.warnings() {
            tracing::warn!(
                provider = %self.id,
                pointer = %warning.pointer,
                message = %warning.message_literal,
                "stored configuration does not match its schema"
            );
        }
        Ok(blob)
    }

    /// Strictly validate `blob` and store it under the current schema version
    ///
    /// Nothing is written when validation reports any violation.
    ///
    /// # Errors
    /// - [`ProviderError::ValidationFailed`] carrying every violation
    /// - [`ProviderError::Store`] if the write fails
    pub async fn store_valid_configuration(
        &self,
        blob: &Blob,
        actor: &Actor,
        summary: &str,
    ) -> Result<()> {
        let status = self.validator.validate_strictly(blob);
        if !status.is_ok() {
            tracing::debug!(
                provider = %self.id,
                error_count = status.errors().len() + status.warnings().len(),
                "rejected invalid configuration"
            );
            return Err(ProviderError::ValidationFailed(status));
        }

        let version = self.validator.schema_version();
        self.store.store(blob, version, actor, summary).await?;
        tracing::info!(provider = %self.id, %actor, version, "stored configuration");
        Ok(())
    }

    /// Schema version recorded with the stored data
    ///
    /// # Errors
    /// Returns [`ProviderError::Store`] if the store cannot be read.
    pub async fn stored_version(&self) -> Result<Option<String>> {
        Ok(self.store.version().await?)
    }

    /// Convert the stored configuration to `target` without writing it
    ///
    /// # Errors
    /// See [`SchemaMigrator::convert_data_to_version`].
    pub async fn migrate_to_version(&self, target: &str) -> Result<Blob> {
        self.migrator.convert_data_to_version(self, target).await
    }

    /// Record `version` as the schema version of unversioned stored data
    ///
    /// Stamping data that already records `version` does nothing.
    ///
    /// # Errors
    /// - [`ProviderError::SchemaNotSupported`] for schemaless validators
    /// - [`ProviderError::Schema`] if `version` is not registered
    /// - [`ProviderError::AlreadyVersioned`] if another version is recorded
    /// - [`ProviderError::Store`] if the store fails
    pub async fn stamp_version(&self, version: &str, actor: &Actor, summary: &str) -> Result<()> {
        let reader = self
            .schema_reader()?
            .version_manager()
            .get_version_for_schema(version)?;
        let version = reader.version().unwrap_or(version);

        self.store.invalidate().await;
        let stored = self.store.load_versioned().await?;
        if let Some(existing) = stored.version {
            if SchemaVersion::compare(&existing, version)? == Ordering::Equal {
                return Ok(());
            }
            return Err(ProviderError::AlreadyVersioned {
                provider: self.id.clone(),
                version: existing,
            });
        }

        self.store.store(&stored.data, Some(version), actor, summary).await?;
        tracing::info!(provider = %self.id, %actor, version, "stamped configuration version");
        Ok(())
    }

    /// Migrate stored data to the current schema version and write it back
    ///
    /// # Errors
    /// - [`ProviderError::SchemaNotSupported`] for schemaless validators
    /// - [`ProviderError::MissingVersionData`] if the data is unversioned
    /// - [`ProviderError::ValidationFailed`] if migrated data is invalid
    /// - any migration or store error
    pub async fn upgrade_stored_configuration(&self, actor: &Actor, summary: &str) -> Result<Blob> {
        let reader = self.schema_reader()?;
        let target = reader
            .version()
            .ok_or_else(|| confset_schema::SchemaError::NotVersioned(reader.schema_id().to_string()))?;
        let stored = self.store.load_versioned().await?;
        let from = stored
            .version
            .clone()
            .ok_or_else(|| ProviderError::MissingVersionData {
                provider: self.id.clone(),
            })?;

        if SchemaVersion::compare(&from, target)? == Ordering::Equal {
            return self.finish_load(stored.data);
        }

        let data = self.migrator.convert_stored(self, stored, target)?;
        self.store_valid_configuration(&data, actor, summary).await?;
        tracing::info!(provider = %self.id, %from, to = target, "upgraded stored configuration");
        Ok(data)
    }

    /// Drop cached state after the backing location changed
    pub async fn invalidate(&self) {
        self.store.invalidate().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use confset_store::{MemoryBackend, StaticStore};
    use confset_test_utils::{
        blob, memory_store, number_with_default_registry, EXAMPLE_SCHEMA,
    };
    use confset_validation::{JsonSchemaValidator, NoopValidator};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn example_provider(payload: Option<&str>) -> (MemoryBackend, ConfigurationProvider) {
        let (backend, store) = memory_store("memory:Example.json", payload);
        let validator =
            JsonSchemaValidator::new(number_with_default_registry().reader(EXAMPLE_SCHEMA).unwrap())
                .unwrap();
        let provider = ConfigurationProvider::new("Example", store, Arc::new(validator));
        (backend, provider)
    }

    #[tokio::test]
    async fn empty_store_loads_defaults() {
        let (_, provider) = example_provider(None);
        let config = provider.load_valid_configuration().await.unwrap();
        assert_eq!(config, blob(json!({"NumberWithDefault": 0})));
    }

    #[tokio::test]
    async fn defaults_never_overwrite_stored_values() {
        let (_, provider) = example_provider(Some(r#"{"NumberWithDefault": 7}"#));
        let config = provider.load_valid_configuration().await.unwrap();
        assert_eq!(config["NumberWithDefault"], json!(7));
    }

    #[tokio::test]
    async fn invalid_write_never_reaches_the_store() {
        let (backend, provider) = example_provider(None);
        let err = provider
            .store_valid_configuration(
                &blob(json!({"NumberWithDefault": "x"})),
                &Actor::new("Admin"),
                "bad",
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert!(backend.writes().is_empty());
    }

    #[tokio::test]
    async fn valid_write_is_stamped_with_current_version() {
        let (backend, provider) = example_provider(None);
        provider
            .store_valid_configuration(
                &blob(json!({"NumberWithDefault": 42})),
                &Actor::new("Admin"),
                "set",
            )
            .await
            .unwrap();

        assert_eq!(provider.stored_version().await.unwrap().as_deref(), Some("1.0.0"));
        assert!(backend.payload().unwrap().contains("\"$version\":\"1.0.0\""));
    }

    #[tokio::test]
    async fn schemaless_provider_guards_schema_operations() {
        let provider = ConfigurationProvider::new(
            "Plain",
            Arc::new(StaticStore::from_json(r#"{"Anything": true}"#).unwrap()),
            Arc::new(NoopValidator::new()),
        );

        assert_eq!(provider.get_schema(None).unwrap_err().kind(), ErrorKind::SchemaNotSupported);
        assert_eq!(provider.get_defaults(None).unwrap_err().kind(), ErrorKind::SchemaNotSupported);
        assert_eq!(
            provider.load_valid_configuration().await.unwrap(),
            blob(json!({"Anything": true}))
        );
    }

    #[tokio::test]
    async fn exposes_schema_and_defaults() {
        let (_, provider) = example_provider(None);
        let schema = provider.get_schema(Some("1.0.0")).unwrap();
        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(provider.get_defaults(None).unwrap(), blob(json!({"NumberWithDefault": 0})));
        assert_eq!(
            provider.get_schema(Some("2.0.0")).unwrap_err().kind(),
            ErrorKind::Schema
        );
    }

    #[tokio::test]
    async fn stamp_version_is_one_time() {
        let (backend, provider) = example_provider(Some(r#"{"NumberWithDefault": 5}"#));
        let admin = Actor::new("Admin");

        provider.stamp_version("1.0", &admin, "stamp").await.unwrap();
        assert_eq!(provider.stored_version().await.unwrap().as_deref(), Some("1.0.0"));

        provider.stamp_version("1.0.0", &admin, "again").await.unwrap();
        assert_eq!(backend.writes().len(), 1);

        let err = provider.stamp_version("2.0.0", &admin, "x").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }
}
