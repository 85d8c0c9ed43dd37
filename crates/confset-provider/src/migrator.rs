//! Schema migration
//!
//! Data moves between versions one edge of the version chain at a time:
//! upward through each successor's converter, downward through each
//! version's own converter. A multi-version jump is always the composition
//! of its single hops.

use crate::error::{ProviderError, Result};
use crate::provider::ConfigurationProvider;
use confset_schema::{Blob, SchemaConverter, SchemaConverterFactory, SchemaReader, SchemaVersion};
use confset_store::Decoded;
use std::cmp::Ordering;
use std::sync::Arc;

/// Upper bound on hops of one migration
pub const DEFAULT_MAX_HOPS: usize = 64;

/// Walks version chains applying pairwise converters
#[derive(Debug, Clone)]
pub struct SchemaMigrator {
    converters: Arc<SchemaConverterFactory>,
    max_hops: usize,
}

impl SchemaMigrator {
    /// Create migrator resolving converters from `converters`
    #[must_use]
    pub fn new(converters: Arc<SchemaConverterFactory>) -> Self {
        Self {
            converters,
            max_hops: DEFAULT_MAX_HOPS,
        }
    }

    /// With hop limit
    #[inline]
    #[must_use]
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Converter registry
    #[inline]
    #[must_use]
    pub fn converters(&self) -> &Arc<SchemaConverterFactory> {
        &self.converters
    }

    /// Load the provider's stored data and convert it to `target`
    ///
    /// Missing properties are filled with the defaults of the version the
    /// data was stored under, never those of the current version.
    ///
    /// # Errors
    /// - [`ProviderError::SchemaNotSupported`] if the provider has no schema
    /// - store failures, unchanged
    /// - [`ProviderError::MissingVersionData`] if the stored data has no version
    /// - any error of [`convert`](Self::convert)
    pub async fn convert_data_to_version(
        &self,
        provider: &ConfigurationProvider,
        target: &str,
    ) -> Result<Blob> {
        provider.schema_reader()?;
        let stored = provider.store().load_versioned().await?;
        self.convert_stored(provider, stored, target)
    }

    pub(crate) fn convert_stored(
        &self,
        provider: &ConfigurationProvider,
        stored: Decoded,
        target: &str,
    ) -> Result<Blob> {
        let builder = provider.schema_builder()?;
        let from = stored
            .version
            .ok_or_else(|| ProviderError::MissingVersionData {
                provider: provider.id().to_string(),
            })?;

        let mut data = stored.data;
        for (name, default) in builder.get_defaults_map(Some(&from), true)? {
            data.entry(name).or_insert(default);
        }
        self.convert(builder.reader(), data, &from, target)
    }

    /// Convert `data` of schema version `from` into version `to`
    ///
    /// `reader` may be any version of the schema.
    ///
    /// # Errors
    /// - [`ProviderError::Schema`] if either version is not registered
    /// - [`ProviderError::MissingConverter`] if a hop has no converter
    /// - [`ProviderError::Conversion`] if a converter rejects the data
    /// - [`ProviderError::VersionUnreachable`] if the chain ends or skips past `to`
    /// - [`ProviderError::MigrationCycle`] if the hop limit is exceeded
    pub fn convert(&self, reader: &SchemaReader, data: Blob, from: &str, to: &str) -> Result<Blob> {
        let direction = SchemaVersion::compare(from, to)?;
        if direction == Ordering::Equal {
            return Ok(data);
        }

        let manager = reader.version_manager();
        let target = SchemaVersion::parse(to)?;
        manager.get_version_for_schema(to)?;
        let mut current = manager.get_version_for_schema(from)?;
        let mut data = data;
        let mut hops = 0;

        loop {
            let at = SchemaVersion::parse(current.version().unwrap_or(from))?;
            if at == target {
                break;
            }
            if hops == self.max_hops {
                return Err(ProviderError::MigrationCycle {
                    schema_id: reader.schema_id().to_string(),
                    hops,
                });
            }
            hops += 1;

            let unreachable = || ProviderError::VersionUnreachable {
                schema_id: reader.schema_id().to_string(),
                from: from.to_string(),
                to: to.to_string(),
            };
            let (next, converter_owner) = match direction {
                Ordering::Less => {
                    let next = manager.get_version_for_schema(
                        current.next_version().ok_or_else(unreachable)?,
                    )?;
                    (next.clone(), next)
                }
                _ => {
                    let previous = manager.get_version_for_schema(
                        current.previous_version().ok_or_else(unreachable)?,
                    )?;
                    (previous, current.clone())
                }
            };

            let next_version = SchemaVersion::parse(next.version().unwrap_or(to))?;
            // Each hop must move strictly toward the target without passing it
            let progresses = match direction {
                Ordering::Less => next_version > at && next_version <= target,
                _ => next_version < at && next_version >= target,
            };
            if !progresses {
                return Err(unreachable());
            }

            let converter = self.converter_for(&converter_owner)?;
            data = match direction {
                Ordering::Less => converter.upgrade_from_older(data),
                _ => converter.downgrade_from_newer(data),
            }
            .map_err(|source| ProviderError::Conversion {
                from: at.to_string(),
                to: next_version.to_string(),
                source,
            })?;

            tracing::debug!(
                schema = reader.schema_id(),
                from = %at,
                to = %next_version,
                "applied migration hop"
            );
            current = next;
        }

        tracing::info!(schema = reader.schema_id(), from, to, hops, "migrated configuration");
        Ok(data)
    }

    fn converter_for(&self, reader: &SchemaReader) -> Result<Box<dyn SchemaConverter>> {
        let missing = |converter_id: Option<&str>| ProviderError::MissingConverter {
            schema_id: reader.schema_id().to_string(),
            version: reader.version().unwrap_or_default().to_string(),
            converter_id: converter_id.map(str::to_string),
        };
        let id = reader.schema_converter_id().ok_or_else(|| missing(None))?;
        self.converters.get(id).ok_or_else(|| missing(Some(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use confset_schema::{SchemaDefinition, SchemaRegistry};
    use confset_test_utils::{blob, profile_converters, profile_registry, PROFILE_SCHEMA};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn migrator() -> SchemaMigrator {
        SchemaMigrator::new(profile_converters())
    }

    fn reader() -> SchemaReader {
        profile_registry().reader(PROFILE_SCHEMA).unwrap()
    }

    #[test]
    fn same_version_is_a_no_op() {
        let data = blob(json!({"Anything": [1, 2]}));
        let converted = migrator().convert(&reader(), data.clone(), "2.0.0", "2.0").unwrap();
        assert_eq!(converted, data);
    }

    #[test]
    fn upgrades_across_the_chain() {
        let converted = migrator()
            .convert(&reader(), blob(json!({"Name": "Ada"})), "1.0.0", "3.0.0")
            .unwrap();
        assert_eq!(converted, blob(json!({"FullName": "Ada", "Tags": []})));
    }

    #[test]
    fn downgrades_across_the_chain() {
        let converted = migrator()
            .convert(
                &reader(),
                blob(json!({"FullName": "Ada", "Tags": ["x"]})),
                "3.0.0",
                "1.0.0",
            )
            .unwrap();
        assert_eq!(converted, blob(json!({"Name": "Ada"})));
    }

    #[test]
    fn chain_composition() {
        let migrator = migrator();
        let reader = reader();
        let data = blob(json!({"Name": "Ada"}));

        let direct = migrator.convert(&reader, data.clone(), "1.0.0", "3.0.0").unwrap();
        let step = migrator.convert(&reader, data, "1.0.0", "2.0.0").unwrap();
        let stepped = migrator.convert(&reader, step, "2.0.0", "3.0.0").unwrap();
        assert_eq!(direct, stepped);
    }

    #[test]
    fn missing_converter_halts() {
        let converters = SchemaConverterFactory::new()
            .with_converter::<confset_test_utils::RenameNameConverter>("profile-v2");
        let err = SchemaMigrator::new(Arc::new(converters))
            .convert(&reader(), blob(json!({"Name": "Ada"})), "1.0.0", "3.0.0")
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MissingConverter);
        assert!(matches!(
            err,
            ProviderError::MissingConverter { ref version, ref converter_id, .. }
                if version == "3.0.0" && converter_id.as_deref() == Some("profile-v3")
        ));
    }

    #[test]
    fn unknown_target_version() {
        let err = migrator()
            .convert(&reader(), Blob::new(), "1.0.0", "9.0.0")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn broken_chain_is_unreachable() {
        let mut registry = SchemaRegistry::new();
        registry
            .register_all([
                SchemaDefinition::new("Gap").with_version("1.0.0"),
                SchemaDefinition::new("Gap")
                    .with_version("2.0.0")
                    .with_converter("gap-v2"),
            ])
            .unwrap();
        let reader = Arc::new(registry).reader("Gap").unwrap();

        let err = migrator()
            .convert(&reader, Blob::new(), "1.0.0", "2.0.0")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BrokenVersionChain);
    }

    #[test]
    fn backwards_link_is_rejected() {
        let mut registry = SchemaRegistry::new();
        registry
            .register_all([
                SchemaDefinition::new("Loop")
                    .with_version("1.0.0")
                    .with_next_version("2.0.0"),
                SchemaDefinition::new("Loop")
                    .with_version("2.0.0")
                    .with_next_version("1.0.0")
                    .with_converter("loop"),
                SchemaDefinition::new("Loop").with_version("3.0.0"),
            ])
            .unwrap();
        let reader = Arc::new(registry).reader("Loop").unwrap();

        let err = migrator()
            .convert(&reader, Blob::new(), "2.0.0", "3.0.0")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BrokenVersionChain);
    }

    #[test]
    fn hop_limit_is_enforced() {
        let err = migrator()
            .with_max_hops(1)
            .convert(&reader(), blob(json!({"Name": "Ada"})), "1.0.0", "3.0.0")
            .unwrap_err();
        assert!(matches!(err, ProviderError::MigrationCycle { hops: 1, .. }));
    }
}
