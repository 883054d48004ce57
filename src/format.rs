use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ValidationFailure;

/// Flat error structure, useful for form validation.
///
/// - `form_errors`: errors reported at the root path
/// - `field_errors`: messages grouped by full dotted path
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlatErrors {
    pub form_errors: Vec<String>,
    pub field_errors: BTreeMap<String, Vec<String>>,
}

/// Group the messages of a failure by path.
///
/// # Example
/// ```
/// use reqvld::format::flatten_errors;
/// use reqvld::{FieldError, ValidationFailure};
/// use serde_json::json;
///
/// let failure = ValidationFailure::new(vec![
///     FieldError::new("autor.nombre", json!(null), "required"),
///     FieldError::new("autor.nombre", json!(null), "too short"),
/// ]);
/// let flat = flatten_errors(&failure);
/// assert_eq!(flat.field_errors["autor.nombre"].len(), 2);
/// assert!(flat.form_errors.is_empty());
/// ```
pub fn flatten_errors(failure: &ValidationFailure) -> FlatErrors {
    let mut flat = FlatErrors::default();
    for e in &failure.errors {
        if e.path.is_empty() {
            flat.form_errors.push(e.message.clone());
        } else {
            flat.field_errors
                .entry(e.path.clone())
                .or_default()
                .push(e.message.clone());
        }
    }
    flat
}

/// Format a failure into a human-readable string.
///
/// # Example output
/// ```text
/// ✖ Field titulo is required.
///   → at titulo
/// ✖ Field precio must be greater than or equal to 0.
///   → at precio, received -124
/// ```
pub fn prettify_errors(failure: &ValidationFailure) -> String {
    let mut lines = Vec::new();

    for e in &failure.errors {
        lines.push(format!("✖ {}", e.message));
        let mut parts = Vec::new();
        if !e.path.is_empty() {
            parts.push(format!("at {}", e.path));
        }
        if !e.value.is_null() {
            parts.push(format!("received {}", crate::error::format_value_short(&e.value)));
        }
        if !parts.is_empty() {
            lines.push(format!("  → {}", parts.join(", ")));
        }
    }

    lines.join("\n")
}

/// The JSON body a transport layer answers a failed request with:
/// `{ "name": "InputDataValidationError", "errors": [{ "path", "value", "msg" }] }`.
pub fn to_payload(failure: &ValidationFailure) -> Value {
    json!({
        "name": ValidationFailure::NAME,
        "errors": failure.errors,
    })
}
