//! Pairwise schema converters
//!
//! A converter moves data across exactly one edge of a version chain. The
//! converter is attached to the newer version of the pair: it upgrades data
//! from the version's predecessor and downgrades data back to it.

use crate::Blob;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Data transformer between two adjacent schema versions
pub trait SchemaConverter: Send + Sync {
    /// Convert data of the predecessor version into this version
    ///
    /// # Errors
    /// Returns [`ConversionError`] if the data has an unexpected shape.
    fn upgrade_from_older(&self, data: Blob) -> Result<Blob, ConversionError>;

    /// Convert data of this version back into the predecessor version
    ///
    /// # Errors
    /// Returns [`ConversionError`] if the data has an unexpected shape.
    fn downgrade_from_newer(&self, data: Blob) -> Result<Blob, ConversionError>;
}

/// Converter failed to transform data
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("conversion failed: {0}")]
pub struct ConversionError(pub String);

impl ConversionError {
    /// Create conversion error
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Constructor registered for a converter id
pub type ConverterConstructor = Arc<dyn Fn() -> Box<dyn SchemaConverter> + Send + Sync>;

/// Registry of converter constructors keyed by converter id
#[derive(Clone, Default)]
pub struct SchemaConverterFactory {
    constructors: HashMap<String, ConverterConstructor>,
}

impl SchemaConverterFactory {
    /// Create empty factory
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor closure
    pub fn register<F>(&mut self, id: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn SchemaConverter> + Send + Sync + 'static,
    {
        self.constructors.insert(id.into(), Arc::new(constructor));
    }

    /// Register a converter type constructed through [`Default`]
    pub fn register_default<C>(&mut self, id: impl Into<String>)
    where
        C: SchemaConverter + Default + 'static,
    {
        self.register(id, || Box::new(C::default()) as Box<dyn SchemaConverter>);
    }

    /// Builder-style [`SchemaConverterFactory::register_default`]
    #[must_use]
    pub fn with_converter<C>(mut self, id: impl Into<String>) -> Self
    where
        C: SchemaConverter + Default + 'static,
    {
        self.register_default::<C>(id);
        self
    }

    /// Instantiate the converter registered under `id`
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Box<dyn SchemaConverter>> {
        self.constructors.get(id).map(|construct| construct())
    }

    /// Check if a converter is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.constructors.contains_key(id)
    }

    /// Registered converter ids
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.constructors.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered converters
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Check if factory is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl fmt::Debug for SchemaConverterFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaConverterFactory")
            .field("converters", &self.ids())
            .finish()
    }
}
