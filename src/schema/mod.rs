//! Schema engine capability.
//!
//! The validator middleware only needs two things from a schema engine: a
//! constructor that turns a list of field descriptors into a [`Schema`], and
//! [`Schema::validate`], which either returns normalized data or an error
//! whose text can be shown to a client. Those seams are the traits in this
//! module; any engine that implements them can back
//! [`validate_with`](crate::middleware::validate_with).
//!
//! The crate also ships a default engine: [`Field`] descriptors compiled by
//! [`structure`] (or a configured [`Engine`]) into a strict object schema,
//! [`Struct`]:
//!
//! ```rust
//! use serde_json::json;
//! use sieve::schema::{structure, Field, Schema};
//!
//! let schema = structure(vec![
//!     Field::string("name").length(Some(1), Some(64)),
//!     Field::integer("page").coerce().default(json!(1)),
//! ]).unwrap();
//!
//! let data = schema.validate(&json!({"name": "Ada", "page": "3"})).unwrap();
//! assert_eq!(data, json!({"name": "Ada", "page": 3}));
//!
//! let err = schema.validate(&json!({"name": 42})).unwrap_err();
//! assert_eq!(err.to_string(), "Expected a string for `name`, got a number");
//! ```

mod field;
mod rules;
mod structure;

use std::fmt;

use serde_json::Value;

pub use field::{Field, Kind, Rule};
pub use structure::{structure, Engine, Struct, StructError};

/// A compiled, reusable validator.
///
/// Built once and shared read-only between every request a middleware
/// handles, hence `Send + Sync`.
pub trait Schema: Send + Sync + 'static {
    type Error: EngineError;

    /// Checks `data` and returns its normalized form.
    fn validate(&self, data: &Value) -> Result<Value, Self::Error>;
}

/// The only shape the validator middleware assumes of an engine's errors:
/// a display message, and optionally a more specific reason that takes
/// precedence over it.
pub trait EngineError: fmt::Display {
    fn reason(&self) -> Option<&str> {
        None
    }
}

/// Marker for single field descriptors, so that one descriptor, a `Vec` of
/// them, or an array of them can all be passed where fields are expected.
///
/// Implement it for the descriptor type of a custom engine.
pub trait Descriptor {}

/// Normalizes a field specification into an ordered list of descriptors.
pub trait IntoFields<D> {
    fn into_fields(self) -> Vec<D>;
}

impl<D: Descriptor> IntoFields<D> for D {
    fn into_fields(self) -> Vec<D> {
        vec![self]
    }
}

impl<D> IntoFields<D> for Vec<D> {
    fn into_fields(self) -> Vec<D> {
        self
    }
}

impl<D, const N: usize> IntoFields<D> for [D; N] {
    fn into_fields(self) -> Vec<D> {
        Vec::from(self)
    }
}

/// Failure to build a schema from its field descriptors.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("a schema needs at least one field")]
    NoFields,

    #[error("field `{0}` is declared more than once")]
    DuplicateField(String),

    #[error("field `{field}` uses unknown type `{kind}`")]
    UnknownType { field: String, kind: String },

    #[error("field `{field}` has an invalid pattern: {source}")]
    Pattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("default for field `{field}` is rejected by its own rules: {message}")]
    InvalidDefault { field: String, message: String },

    /// For engines other than the built-in one.
    #[error("{0}")]
    Other(String),
}
