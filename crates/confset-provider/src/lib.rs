//! confset Provider Layer
//!
//! Composes a [`ConfigurationStore`](confset_store::ConfigurationStore) and a
//! [`Validator`](confset_validation::Validator) into the single entry point
//! through which configuration is read, written and migrated.
//!
//! # Data flow
//!
//! ```text
//! read:  Store.load ──► fill defaults ──► validate (permissive) ──► caller
//! write: caller ──► validate (strict) ──► Store.store ──► cache invalidation
//! ```
//!
//! # Example
//!
//! ```rust
//! use confset_provider::ConfigurationProvider;
//! use confset_schema::{SchemaDefinition, SchemaRegistry};
//! use confset_store::StaticStore;
//! use confset_validation::JsonSchemaValidator;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = SchemaRegistry::new();
//! registry.register(
//!     SchemaDefinition::new("Example")
//!         .with_version("1.0.0")
//!         .with_property("NumberWithDefault", json!({"type": "number", "default": 0})),
//! )?;
//! let reader = Arc::new(registry).reader("Example")?;
//!
//! let provider = ConfigurationProvider::new(
//!     "Example",
//!     Arc::new(StaticStore::empty()),
//!     Arc::new(JsonSchemaValidator::new(reader)?),
//! );
//! let config = provider.load_valid_configuration().await?;
//! assert_eq!(config["NumberWithDefault"], json!(0));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod factory;
pub mod migrator;
pub mod provider;

pub use config::{ComponentConfig, FactoryConfig, ProviderConfig};
pub use error::{ErrorKind, FactoryError, ProviderError, Result};
pub use factory::{ProviderFactory, ProviderRegistry, StoreContext};
pub use migrator::SchemaMigrator;
pub use provider::ConfigurationProvider;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
