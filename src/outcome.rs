use serde::Serialize;
use serde_json::Value;

use crate::error::{FieldError, ValidationFailure};

/// Errors and sanitized result of one validation pass.
///
/// `result` is `None` when the validated subtree was absent. A non-empty
/// `errors` list means the result must not be used.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationOutcome {
    pub errors: Vec<FieldError>,
    pub result: Option<Value>,
}

impl ValidationOutcome {
    pub fn ok(result: Option<Value>) -> Self {
        Self {
            errors: vec![],
            result,
        }
    }

    pub fn failed(errors: Vec<FieldError>) -> Self {
        Self {
            errors,
            result: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.path.as_str()).collect()
    }

    /// Convert into the sanitized value or the aggregate failure.
    ///
    /// An absent result becomes `null`.
    pub fn into_result(self) -> Result<Value, ValidationFailure> {
        aggregate(self)
    }
}

/// Turn an outcome into the sanitized value, or a [`ValidationFailure`]
/// carrying every error in report order.
///
/// ```
/// use reqvld::{aggregate, FieldError, ValidationOutcome};
/// use serde_json::json;
///
/// let ok = ValidationOutcome::ok(Some(json!({ "precio": 10.0 })));
/// assert_eq!(aggregate(ok).unwrap(), json!({ "precio": 10.0 }));
///
/// let bad = ValidationOutcome::failed(vec![FieldError::new("titulo", json!(null), "required")]);
/// assert_eq!(aggregate(bad).unwrap_err().paths(), vec!["titulo"]);
/// ```
pub fn aggregate(outcome: ValidationOutcome) -> Result<Value, ValidationFailure> {
    if outcome.errors.is_empty() {
        Ok(outcome.result.unwrap_or(Value::Null))
    } else {
        Err(ValidationFailure::new(outcome.errors))
    }
}
