//! Testing utilities for confset workspace
//!
//! Shared schema chains, converters and store helpers.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use confset_schema::{
    Blob, ConversionError, SchemaConverter, SchemaConverterFactory, SchemaDefinition,
    SchemaRegistry,
};
use confset_store::{CacheConfig, CachingStore, MemoryBackend, MokaSharedCache};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub const EXAMPLE_SCHEMA: &str = "Example";
pub const PROFILE_SCHEMA: &str = "Profile";
pub const NESTED_SCHEMA: &str = "Nested";

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub fn blob(value: Value) -> Blob {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// `Example` 1.0.0 with `NumberWithDefault: number = 0`
pub fn number_with_default_schema() -> SchemaDefinition {
    SchemaDefinition::new(EXAMPLE_SCHEMA)
        .with_version("1.0.0")
        .with_property(
            "NumberWithDefault",
            json!({"type": "number", "default": 0}),
        )
}

pub fn number_with_default_registry() -> Arc<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    registry.register(number_with_default_schema()).unwrap();
    Arc::new(registry)
}

/// `Profile` 1.0.0 → 2.0.0 → 3.0.0
///
/// - 1.0.0: `Name`
/// - 2.0.0: `Name` renamed to `FullName` (converter `profile-v2`)
/// - 3.0.0: adds `Tags`, default `[]` (converter `profile-v3`)
pub fn profile_chain() -> Vec<SchemaDefinition> {
    vec![
        SchemaDefinition::new(PROFILE_SCHEMA)
            .with_version("1.0.0")
            .with_next_version("2.0.0")
            .with_property("Name", json!({"type": "string"})),
        SchemaDefinition::new(PROFILE_SCHEMA)
            .with_version("2.0.0")
            .with_previous_version("1.0.0")
            .with_next_version("3.0.0")
            .with_converter("profile-v2")
            .with_property("FullName", json!({"type": "string"})),
        SchemaDefinition::new(PROFILE_SCHEMA)
            .with_version("3.0.0")
            .with_previous_version("2.0.0")
            .with_converter("profile-v3")
            .with_property("FullName", json!({"type": "string"}))
            .with_property(
                "Tags",
                json!({"type": "array", "items": {"type": "string"}, "default": []}),
            ),
    ]
}

pub fn profile_registry() -> Arc<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    registry.register_all(profile_chain()).unwrap();
    Arc::new(registry)
}

#[derive(Debug, Default)]
pub struct RenameNameConverter;

impl SchemaConverter for RenameNameConverter {
    fn upgrade_from_older(&self, mut data: Blob) -> Result<Blob, ConversionError> {
        if let Some(name) = data.remove("Name") {
            data.insert("FullName".into(), name);
        }
        Ok(data)
    }

    fn downgrade_from_newer(&self, mut data: Blob) -> Result<Blob, ConversionError> {
        if let Some(name) = data.remove("FullName") {
            data.insert("Name".into(), name);
        }
        Ok(data)
    }
}

#[derive(Debug, Default)]
pub struct TagsConverter;

impl SchemaConverter for TagsConverter {
    fn upgrade_from_older(&self, mut data: Blob) -> Result<Blob, ConversionError> {
        data.entry("Tags").or_insert_with(|| json!([]));
        Ok(data)
    }

    fn downgrade_from_newer(&self, mut data: Blob) -> Result<Blob, ConversionError> {
        data.remove("Tags");
        Ok(data)
    }
}

pub fn profile_converters() -> Arc<SchemaConverterFactory> {
    Arc::new(
        SchemaConverterFactory::new()
            .with_converter::<RenameNameConverter>("profile-v2")
            .with_converter::<TagsConverter>("profile-v3"),
    )
}

/// `Nested` with an object of objects whose leaves carry defaults
pub fn nested_defaults_registry() -> Arc<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    registry
        .register(
            SchemaDefinition::new(NESTED_SCHEMA)
                .with_version("1.0.0")
                .with_property(
                    "Outer",
                    json!({
                        "type": "object",
                        "properties": {
                            "Inner": {
                                "type": "object",
                                "properties": {
                                    "Leaf": {"type": "number", "default": 1},
                                    "Label": {"type": "string", "default": "leaf"}
                                }
                            },
                            "Flag": {"type": "boolean", "default": true}
                        }
                    }),
                )
                .with_property("Plain", json!({"type": "string", "default": "plain"})),
        )
        .unwrap();
    Arc::new(registry)
}

/// Caching store over a fresh memory backend holding `payload`
pub fn memory_store(
    location: &str,
    payload: Option<&str>,
) -> (MemoryBackend, Arc<CachingStore<MemoryBackend>>) {
    let backend = match payload {
        Some(payload) => MemoryBackend::with_payload(location, payload),
        None => MemoryBackend::new(location),
    };
    let store = CachingStore::new(
        backend.clone(),
        Arc::new(MokaSharedCache::default()),
        CacheConfig::default(),
    );
    (backend, Arc::new(store))
}
