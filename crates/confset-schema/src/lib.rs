//! confset Schema Layer
//!
//! Declarative, versioned JSON Schemas for configuration blobs.
//!
//! # Core Concepts
//!
//! - [`SchemaDefinition`]: one concrete schema version, declared as data
//! - [`SchemaRegistry`]: all known definitions, keyed by schema id and version
//! - [`SchemaReader`]: read access to one definition plus its version links
//! - [`SchemaVersionManager`]: resolves sibling versions of a schema
//! - [`SchemaBuilder`]: wire-format JSON Schema documents and defaults maps
//! - [`SchemaConverter`] / [`SchemaConverterFactory`]: pairwise data migrations
//!
//! # Version chain
//!
//! ```text
//! 1.0.0 ⇄ 2.0.0 ⇄ 3.0.0 (current)
//!         └ converter "v2" bridges 1.0.0 → 2.0.0
//! ```
//!
//! # Example
//!
//! ```rust
//! use confset_schema::{SchemaBuilder, SchemaDefinition, SchemaRegistry};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let mut registry = SchemaRegistry::new();
//! registry
//!     .register(
//!         SchemaDefinition::new("Example")
//!             .with_version("1.0.0")
//!             .with_property("NumberWithDefault", json!({"type": "number", "default": 0})),
//!     )
//!     .unwrap();
//! let registry = Arc::new(registry);
//!
//! let builder = SchemaBuilder::new(registry.reader("Example").unwrap());
//! let defaults = builder.get_defaults_map(None, true).unwrap();
//! assert_eq!(defaults["NumberWithDefault"], json!(0));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod builder;
pub mod converter;
pub mod definition;
pub mod error;
pub mod reader;
pub mod registry;
pub mod version;

pub use builder::SchemaBuilder;
pub use converter::{ConversionError, ConverterConstructor, SchemaConverter, SchemaConverterFactory};
pub use definition::{DynamicDefault, SchemaDefinition, DEFAULT_DIALECT};
pub use error::SchemaError;
pub use reader::{SchemaReader, SchemaVersionManager};
pub use registry::SchemaRegistry;
pub use version::SchemaVersion;

/// A decoded configuration blob: always a JSON object at the top level
pub type Blob = serde_json::Map<String, serde_json::Value>;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
