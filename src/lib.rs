//! # reqvld — recursive validation of request payloads
//!
//! `reqvld` checks nested JSON payloads (objects and arrays of objects,
//! arbitrarily deep) against a declarative field schema. A schema is bound
//! once, at startup, into an immutable tree and then validated against any
//! number of inputs, concurrently if needed.
//!
//! Validation is fail-slow: every leaf is visited and every problem is
//! reported in one pass, each with a dotted path, the rejected value and a
//! rendered message. On success the result is a sanitized copy of the input
//! with undeclared keys stripped and values coerced to their declared types.
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//!
//! let schema = reqvld::bind(
//!     &reqvld::object()
//!         .field("titulo", reqvld::string().not_null().len(1, 100))
//!         .field("precio", reqvld::float().min(0))
//!         .field("autores", reqvld::array(
//!             reqvld::object().field("nombre", reqvld::string().not_null()),
//!         ))
//!         .into(),
//! )
//! .unwrap();
//!
//! let ok = schema
//!     .check_blocking(&json!({ "titulo": "Rayuela", "precio": "12.5", "isbn": "x" }))
//!     .unwrap();
//! assert_eq!(ok, json!({ "titulo": "Rayuela", "precio": 12.5, "autores": [] }));
//!
//! let err = schema.check_blocking(&json!({ "precio": -124, "autores": [{}] })).unwrap_err();
//! let failure = err.as_validation().unwrap();
//! assert_eq!(failure.paths(), vec!["titulo", "precio", "autores.nombre"]);
//! ```

pub mod bind;
pub mod config;
pub mod data_type;
pub mod definition;
pub mod error;
pub mod evaluator;
pub mod format;
pub mod i18n;
pub mod input;
pub mod outcome;
pub mod request;
mod validate;

#[doc(hidden)]
pub use serde_json;

pub use bind::{BoundSchema, SchemaBinder};
pub use error::{Error, FieldError, SchemaError, UnexpectedError, ValidationFailure};
pub use outcome::{aggregate, ValidationOutcome};

use data_type::{DataType, ScalarType};
use definition::{FieldDef, ObjectDef, RawSchema};

// ---------------------------------------------------------------------------
// Convenience constructors
// ---------------------------------------------------------------------------

/// A `STRING` field.
pub fn string() -> FieldDef {
    FieldDef::new(DataType::STRING)
}

/// An `INTEGER` field.
pub fn integer() -> FieldDef {
    FieldDef::new(DataType::INTEGER)
}

/// A `FLOAT` field.
pub fn float() -> FieldDef {
    FieldDef::new(DataType::FLOAT)
}

/// A `BOOLEAN` field.
pub fn boolean() -> FieldDef {
    FieldDef::new(DataType::BOOLEAN)
}

/// A `DATE` field. Accepted values are normalized to RFC 3339 UTC.
pub fn date() -> FieldDef {
    FieldDef::new(DataType::DATE)
}

/// A `DATEONLY` field (`YYYY-MM-DD`).
pub fn date_only() -> FieldDef {
    FieldDef::new(DataType::DATEONLY)
}

/// A `JSON` field: any value, passed through unchanged.
pub fn json() -> FieldDef {
    FieldDef::new(DataType::Json)
}

/// A typed array leaf such as `ARRAY(INTEGER)`.
///
/// Unlike [`array`], the whole array is one leaf with one set of
/// constraints.
pub fn array_of(element: ScalarType) -> FieldDef {
    FieldDef::new(DataType::Array(element))
}

/// A field of any [`DataType`].
pub fn field(data_type: DataType) -> FieldDef {
    FieldDef::new(data_type)
}

/// An object node.
pub fn object() -> ObjectDef {
    ObjectDef::new()
}

/// An array node: every element is validated against `element`.
pub fn array(element: impl Into<RawSchema>) -> RawSchema {
    RawSchema::array(element)
}

/// Bind with the standard evaluator, the built-in catalog and default
/// options. Use [`SchemaBinder`] to change any of them.
pub fn bind(raw: &RawSchema) -> Result<BoundSchema, SchemaError> {
    SchemaBinder::new().bind(raw)
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Common imports for working with `reqvld`.
pub mod prelude {
    pub use crate::bind::{BoundSchema, SchemaBinder};
    pub use crate::config::{BindOptions, Concurrency, ShapePolicy};
    pub use crate::data_type::{DataType, ScalarType};
    pub use crate::definition::{FieldDef, ObjectDef, RawSchema};
    pub use crate::error::{Error, FieldError, SchemaError, UnexpectedError, ValidationFailure};
    pub use crate::evaluator::{
        CheckError, ConstraintEvaluator, CustomCheck, StandardEvaluator, Verdict,
    };
    pub use crate::format::{flatten_errors, prettify_errors, to_payload};
    pub use crate::i18n::{Catalog, MessageCatalog};
    pub use crate::input::JsonInput;
    pub use crate::outcome::{aggregate, ValidationOutcome};
    pub use crate::request::{Partition, RequestInput, RequestSchema};
}
