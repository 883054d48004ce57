use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::evaluator::BoxError;

/// One failed leaf: where it failed, what was received and why.
///
/// Serializes as `{ "path": ..., "value": ..., "msg": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the leaf. Array elements reuse the array's path.
    pub path: String,
    /// The rejected value, or `null` when the value was missing.
    pub value: Value,
    /// Fully rendered message.
    #[serde(rename = "msg")]
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, value: Value, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.path.is_empty() {
            write!(f, "{}: ", self.path)?;
        }
        write!(f, "{}", self.message)?;
        if !self.value.is_null() {
            write!(f, ", received {}", format_value_short(&self.value))?;
        }
        Ok(())
    }
}

/// Aggregate of every [`FieldError`] found in one validation pass.
///
/// Errors are accumulated, never short-circuited, so a caller sees every
/// problem in the payload at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{}", summarize(.errors))]
pub struct ValidationFailure {
    pub errors: Vec<FieldError>,
}

impl ValidationFailure {
    /// Name carried in serialized error payloads.
    pub const NAME: &'static str = "InputDataValidationError";

    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Paths of all errors, in report order.
    pub fn paths(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.path.as_str()).collect()
    }
}

fn summarize(errors: &[FieldError]) -> String {
    match errors {
        [] => "validation failed".to_string(),
        [only] => format!("validation failed: {only}"),
        _ => {
            let mut out = format!("validation failed with {} errors:", errors.len());
            for e in errors {
                out.push_str(&format!("\n - {e}"));
            }
            out
        }
    }
}

/// A malformed schema definition. Raised while binding, never per request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("unknown data type `{name}` at `{path}`")]
    UnknownDataType { path: String, name: String },

    #[error("unknown constraint `{name}` at `{path}`")]
    UnknownConstraint { path: String, name: String },

    #[error("invalid arguments for constraint `{name}` at `{path}`: {reason}")]
    InvalidConstraintArgs {
        path: String,
        name: String,
        reason: String,
    },

    #[error("invalid schema node at `{path}`: {reason}")]
    InvalidNode { path: String, reason: String },
}

/// An evaluator or custom check failed for a reason other than the value
/// breaking the constraint.
#[derive(Debug, thiserror::Error)]
#[error("unexpected failure in constraint `{constraint}` at `{path}`: {source}")]
pub struct UnexpectedError {
    pub path: String,
    pub constraint: String,
    #[source]
    pub source: BoxError,
}

/// Top-level error type of the crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// One or more fields failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// The schema could not be bound.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A constraint check failed unexpectedly.
    #[error(transparent)]
    Unexpected(#[from] UnexpectedError),
}

impl Error {
    /// HTTP status a transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::Schema(_) | Error::Unexpected(_) => 500,
        }
    }

    pub fn as_validation(&self) -> Option<&ValidationFailure> {
        match self {
            Error::Validation(v) => Some(v),
            _ => None,
        }
    }
}

/// Returns the JSON type name for a value.
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Format a JSON value for display in errors (short form).
pub fn format_value_short(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            if s.chars().count() > 50 {
                let head: String = s.chars().take(47).collect();
                format!("\"{}...\"", head)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(arr) => format!("Array(len={})", arr.len()),
        Value::Object(obj) => format!("Object(keys={})", obj.len()),
    }
}

/// Cut a rejected value down to `max_len` characters (strings) or
/// `max_len` elements plus a marker entry (arrays).
pub(crate) fn truncate_value(value: &Value, max_len: usize) -> Value {
    match value {
        Value::String(s) if s.chars().count() > max_len => {
            let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
            Value::String(format!("{}...", head))
        }
        Value::Array(arr) if arr.len() > max_len => {
            let mut truncated: Vec<Value> = arr[..max_len].to_vec();
            truncated.push(Value::String(format!("... ({} more)", arr.len() - max_len)));
            Value::Array(truncated)
        }
        _ => value.clone(),
    }
}
