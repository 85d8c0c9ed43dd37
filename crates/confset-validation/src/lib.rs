//! confset Validation Pipeline
//!
//! Validates decoded configuration blobs against a schema and reports every
//! violation as a pointer-addressed [`ValidationError`].
//!
//! # Strictness
//!
//! - **Strict** ([`ValidationMode::Strict`]): used before writes; every
//!   violation is fatal.
//! - **Permissive** ([`ValidationMode::Permissive`]): used when reading data
//!   that was valid when stored; violations become warnings.
//!
//! # Example
//!
//! ```rust,ignore
//! use confset_validation::{JsonSchemaValidator, Validator};
//!
//! let validator = JsonSchemaValidator::new(registry.reader("Example")?)?;
//! let status = validator.validate_strictly(&blob);
//! for error in status.errors() {
//!     println!("{}: {}", error.pointer, error.message_literal);
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod json_schema;
pub mod pointer;
pub mod status;
pub mod validator;

pub use error::ValidatorError;
pub use json_schema::JsonSchemaValidator;
pub use status::{ValidationError, ValidationStatus};
pub use validator::{NoopValidator, ValidationMode, Validator};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
