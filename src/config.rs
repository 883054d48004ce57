//! Binding options.
//!
//! [`BindOptions`] is plain serde data so it can be read from whatever
//! configuration source the host application uses.
//!
//! ```
//! use reqvld::config::{BindOptions, ShapePolicy};
//!
//! let opts = BindOptions::from_json_str(r#"{ "locale": "es", "shapePolicy": "strict" }"#).unwrap();
//! assert_eq!(opts.locale, "es");
//! assert_eq!(opts.shape_policy, ShapePolicy::Strict);
//! assert_eq!(opts.model_name, "input");
//! ```

use serde::{Deserialize, Serialize};

/// What to do with a value whose JSON shape does not match an object or
/// array node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapePolicy {
    /// Read the children of a non-object as absent and treat a non-array as
    /// empty.
    #[default]
    Lenient,
    /// Report a single error at the node's path.
    Strict,
}

/// How sibling fields and array elements are driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Concurrency {
    /// Siblings run concurrently; results keep declaration order.
    #[default]
    Concurrent,
    /// Siblings run one after the other.
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BindOptions {
    /// Locale used to pick message templates.
    pub locale: String,
    /// Value of `{{modelName}}` for fields that do not name a model.
    pub model_name: String,
    pub shape_policy: ShapePolicy,
    pub concurrency: Concurrency,
    /// Longest string (in characters) or array (in elements) echoed back in
    /// a rejected value. `None` reports rejected values unchanged.
    pub max_received_len: Option<usize>,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            locale: crate::i18n::FALLBACK_LOCALE.to_string(),
            model_name: "input".to_string(),
            shape_policy: ShapePolicy::Lenient,
            concurrency: Concurrency::Concurrent,
            max_received_len: None,
        }
    }
}

impl BindOptions {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    pub fn shape_policy(mut self, policy: ShapePolicy) -> Self {
        self.shape_policy = policy;
        self
    }

    pub fn concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn max_received_len(mut self, len: usize) -> Self {
        self.max_received_len = Some(len);
        self
    }
}
