//! Raw (unbound) schema definitions.
//!
//! A schema is a tree whose leaves are [`FieldDef`]s and whose inner nodes
//! are objects ([`ObjectDef`]) or single-element array templates. Build it
//! with the fluent constructors in the crate root or from a declarative JSON
//! document with [`RawSchema::from_json`], then hand it to
//! [`bind`](crate::bind()).
//!
//! # Example
//! ```
//! let schema = reqvld::object()
//!     .field("titulo", reqvld::string().not_null().len(0, 10))
//!     .field("precio", reqvld::float().min(0))
//!     .field("autores", reqvld::array(reqvld::object().field("nombre", reqvld::string())));
//! assert_eq!(schema.keys(), vec!["titulo", "precio", "autores"]);
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::bind::join_path;
use crate::data_type::DataType;
use crate::error::SchemaError;
use crate::evaluator::{AsyncFnCheck, CheckError, CustomCheck, FnCheck};

/// Polymorphic schema node before binding.
#[derive(Debug, Clone)]
pub enum RawSchema {
    Field(FieldDef),
    Object(ObjectDef),
    /// Template applied to every element of an array.
    Array(Box<RawSchema>),
}

/// Declared type of a field: either already known or a name to be resolved
/// while binding.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TypeSpec {
    Known(DataType),
    Named(String),
}

/// How a constraint is checked.
#[derive(Clone)]
pub enum ConstraintRule {
    /// A named rule handled by the constraint evaluator.
    Args(Value),
    /// A function attached to this field only.
    Custom(Arc<dyn CustomCheck>),
}

impl fmt::Debug for ConstraintRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintRule::Args(args) => f.debug_tuple("Args").field(args).finish(),
            ConstraintRule::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// One named constraint of a field.
#[derive(Debug, Clone)]
pub struct ConstraintDef {
    pub name: String,
    pub rule: ConstraintRule,
    /// User message, used verbatim instead of the catalog template.
    pub message: Option<String>,
}

/// Leaf descriptor: expected type, nullability and ordered constraints.
///
/// Fields are nullable by default.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub(crate) data_type: TypeSpec,
    pub(crate) allow_null: bool,
    pub(crate) allow_null_msg: Option<String>,
    pub(crate) model: Option<String>,
    pub(crate) constraints: Vec<ConstraintDef>,
}

impl FieldDef {
    pub fn new(data_type: DataType) -> Self {
        Self::with_spec(TypeSpec::Known(data_type))
    }

    /// A field whose type is given by name (`"STRING"`, `"ARRAY(INTEGER)"`).
    /// Unknown names are reported when the schema is bound.
    pub fn named(type_name: impl Into<String>) -> Self {
        Self::with_spec(TypeSpec::Named(type_name.into()))
    }

    fn with_spec(data_type: TypeSpec) -> Self {
        Self {
            data_type,
            allow_null: true,
            allow_null_msg: None,
            model: None,
            constraints: vec![],
        }
    }

    /// Reject missing and `null` values.
    pub fn not_null(self) -> Self {
        self.allow_null(false)
    }

    pub fn allow_null(mut self, allow: bool) -> Self {
        self.allow_null = allow;
        self
    }

    /// Message reported when a non-nullable value is missing.
    pub fn allow_null_msg(mut self, msg: impl Into<String>) -> Self {
        self.allow_null_msg = Some(msg.into());
        self
    }

    /// Model name used by the `{{modelName}}` placeholder.
    pub fn model(mut self, name: impl Into<String>) -> Self {
        self.model = Some(name.into());
        self
    }

    /// Add a named constraint. A constraint added twice keeps its first
    /// position and the last arguments.
    pub fn constraint(self, name: impl Into<String>, args: impl Into<Value>) -> Self {
        self.push(name.into(), ConstraintRule::Args(args.into()), None)
    }

    /// Add a named constraint with a custom message.
    pub fn constraint_msg(
        self,
        name: impl Into<String>,
        args: impl Into<Value>,
        msg: impl Into<String>,
    ) -> Self {
        self.push(name.into(), ConstraintRule::Args(args.into()), Some(msg.into()))
    }

    /// Add a custom synchronous check. Returning `Err(explanation)` rejects
    /// the value.
    ///
    /// # Example
    /// ```
    /// let even = reqvld::integer().custom("isEven", |v| match v.as_i64() {
    ///     Some(n) if n % 2 == 0 => Ok(()),
    ///     _ => Err("must be even".to_string()),
    /// });
    /// ```
    pub fn custom<F>(self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.push(name.into(), ConstraintRule::Custom(Arc::new(FnCheck(check))), None)
    }

    /// Add a custom synchronous check whose failures are reported as
    /// `"<msg> <explanation>"`.
    pub fn custom_msg<F>(self, name: impl Into<String>, check: F, msg: impl Into<String>) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.push(
            name.into(),
            ConstraintRule::Custom(Arc::new(FnCheck(check))),
            Some(msg.into()),
        )
    }

    /// Add a custom asynchronous check (e.g. a uniqueness lookup).
    pub fn custom_async<F, Fut>(self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CheckError>> + Send + 'static,
    {
        self.push(name.into(), ConstraintRule::Custom(Arc::new(AsyncFnCheck(check))), None)
    }

    /// Attach any [`CustomCheck`] implementation.
    pub fn check_with(self, name: impl Into<String>, check: Arc<dyn CustomCheck>) -> Self {
        self.push(name.into(), ConstraintRule::Custom(check), None)
    }

    fn push(mut self, name: String, rule: ConstraintRule, message: Option<String>) -> Self {
        match self.constraints.iter_mut().find(|c| c.name == name) {
            Some(existing) => {
                existing.rule = rule;
                existing.message = message;
            }
            None => self.constraints.push(ConstraintDef {
                name,
                rule,
                message,
            }),
        }
        self
    }

    // -- shorthands ---------------------------------------------------------

    /// Length between `min` and `max` (characters or elements).
    pub fn len(self, min: usize, max: usize) -> Self {
        self.constraint("len", vec![min, max])
    }

    pub fn len_msg(self, min: usize, max: usize, msg: impl Into<String>) -> Self {
        self.constraint_msg("len", vec![min, max], msg)
    }

    pub fn min(self, bound: impl Into<Value>) -> Self {
        self.constraint("min", bound)
    }

    pub fn min_msg(self, bound: impl Into<Value>, msg: impl Into<String>) -> Self {
        self.constraint_msg("min", bound, msg)
    }

    pub fn max(self, bound: impl Into<Value>) -> Self {
        self.constraint("max", bound)
    }

    pub fn max_msg(self, bound: impl Into<Value>, msg: impl Into<String>) -> Self {
        self.constraint_msg("max", bound, msg)
    }

    /// Value must be one of `values`.
    pub fn is_in<V: Into<Value>>(self, values: Vec<V>) -> Self {
        self.constraint("isIn", Value::Array(vec![Value::from(values)]))
    }

    pub fn not_in<V: Into<Value>>(self, values: Vec<V>) -> Self {
        self.constraint("notIn", Value::Array(vec![Value::from(values)]))
    }

    /// Value must match the regular expression.
    pub fn matches(self, pattern: &str) -> Self {
        self.constraint("is", pattern)
    }

    /// Value must not match the regular expression.
    pub fn not_matches(self, pattern: &str) -> Self {
        self.constraint("not", pattern)
    }

    pub fn not_empty(self) -> Self {
        self.constraint("notEmpty", true)
    }

    pub fn equals(self, expected: impl Into<Value>) -> Self {
        self.constraint("equals", expected)
    }

    pub fn contains(self, needle: &str) -> Self {
        self.constraint("contains", needle)
    }

    pub fn is_email(self) -> Self {
        self.constraint("isEmail", true)
    }

    pub fn is_url(self) -> Self {
        self.constraint("isUrl", true)
    }

    pub fn is_uuid(self) -> Self {
        self.constraint("isUUID", "all")
    }

    pub fn is_int(self) -> Self {
        self.constraint("isInt", true)
    }

    pub fn is_float(self) -> Self {
        self.constraint("isFloat", true)
    }

    pub fn is_date(self) -> Self {
        self.constraint("isDate", true)
    }

    pub fn constraints(&self) -> &[ConstraintDef] {
        &self.constraints
    }

    pub fn is_nullable(&self) -> bool {
        self.allow_null
    }
}

/// Object node: declared keys, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ObjectDef {
    pub(crate) fields: Vec<(String, RawSchema)>,
}

impl ObjectDef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a child node. Redeclaring a key replaces its node in place.
    pub fn field(mut self, name: impl Into<String>, node: impl Into<RawSchema>) -> Self {
        let name = name.into();
        let node = node.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = node,
            None => self.fields.push((name, node)),
        }
        self
    }

    /// Remove a child node.
    pub fn omit(mut self, name: &str) -> Self {
        self.fields.retain(|(k, _)| k != name);
        self
    }

    /// Merge another object's children into this one; `other` wins on
    /// conflicts.
    pub fn extend(self, other: ObjectDef) -> Self {
        other
            .fields
            .into_iter()
            .fold(self, |acc, (k, node)| acc.field(k, node))
    }

    pub fn keys(&self) -> Vec<&str> {
        self.fields.iter().map(|(k, _)| k.as_str()).collect()
    }
}

impl From<FieldDef> for RawSchema {
    fn from(f: FieldDef) -> Self {
        RawSchema::Field(f)
    }
}

impl From<ObjectDef> for RawSchema {
    fn from(o: ObjectDef) -> Self {
        RawSchema::Object(o)
    }
}

impl RawSchema {
    /// Array node whose elements are validated against `element`.
    pub fn array(element: impl Into<RawSchema>) -> Self {
        RawSchema::Array(Box::new(element.into()))
    }

    /// Parse a declarative JSON schema.
    ///
    /// - an object with a string `"type"` member is a field descriptor
    ///   (`type`, `allowNull`, `allowNullMsg`, `model`, `validate`);
    /// - any other object is an object node;
    /// - a one-element array is an array node.
    ///
    /// Each `validate` entry is normalized: an object carrying `args`, `msg`
    /// or `message` is read as-is, any other value `v` means `{ "args": v }`.
    /// Missing `args` default to `true`.
    ///
    /// # Example
    /// ```
    /// use serde_json::json;
    /// use reqvld::definition::RawSchema;
    ///
    /// let raw = RawSchema::from_json(&json!({
    ///     "titulo": { "type": "STRING", "allowNull": false, "validate": { "len": [0, 10] } },
    ///     "tags": [{ "type": "STRING" }]
    /// })).unwrap();
    /// assert!(matches!(raw, RawSchema::Object(_)));
    /// ```
    pub fn from_json(value: &Value) -> Result<RawSchema, SchemaError> {
        parse_node(value, "")
    }
}

fn parse_node(value: &Value, path: &str) -> Result<RawSchema, SchemaError> {
    match value {
        Value::Object(obj) if matches!(obj.get("type"), Some(Value::String(_))) => {
            parse_field(obj, path).map(RawSchema::Field)
        }
        Value::Object(obj) => {
            let mut def = ObjectDef::new();
            for (key, child) in obj {
                def = def.field(key.clone(), parse_node(child, &join_path(path, key))?);
            }
            Ok(RawSchema::Object(def))
        }
        Value::Array(items) => match items.as_slice() {
            [element] => Ok(RawSchema::array(parse_node(element, path)?)),
            _ => Err(SchemaError::InvalidNode {
                path: path.to_string(),
                reason: format!("array templates need exactly one element, found {}", items.len()),
            }),
        },
        other => Err(SchemaError::InvalidNode {
            path: path.to_string(),
            reason: format!(
                "expected a field, object or array template, found {}",
                crate::error::value_type_name(other)
            ),
        }),
    }
}

fn parse_field(obj: &Map<String, Value>, path: &str) -> Result<FieldDef, SchemaError> {
    let type_name = obj.get("type").and_then(Value::as_str).unwrap_or_default();
    let mut field = FieldDef::named(type_name);

    if let Some(allow) = obj.get("allowNull") {
        let allow = allow.as_bool().ok_or_else(|| SchemaError::InvalidNode {
            path: path.to_string(),
            reason: "`allowNull` must be a boolean".to_string(),
        })?;
        field = field.allow_null(allow);
    }
    if let Some(msg) = obj.get("allowNullMsg").and_then(Value::as_str) {
        field = field.allow_null_msg(msg);
    }
    if let Some(model) = obj
        .get("model")
        .or_else(|| obj.get("modelName"))
        .and_then(Value::as_str)
    {
        field = field.model(model);
    }

    match obj.get("validate") {
        None | Some(Value::Null) => {}
        Some(Value::Object(rules)) => {
            for (name, spec) in rules {
                let (args, message) = normalize_constraint(spec);
                field = match message {
                    Some(msg) => field.constraint_msg(name.clone(), args, msg),
                    None => field.constraint(name.clone(), args),
                };
            }
        }
        Some(_) => {
            return Err(SchemaError::InvalidNode {
                path: path.to_string(),
                reason: "`validate` must be an object".to_string(),
            })
        }
    }
    Ok(field)
}

fn normalize_constraint(spec: &Value) -> (Value, Option<String>) {
    match spec {
        Value::Object(obj)
            if obj.contains_key("args") || obj.contains_key("msg") || obj.contains_key("message") =>
        {
            let args = obj.get("args").cloned().unwrap_or(Value::Bool(true));
            let message = obj
                .get("msg")
                .or_else(|| obj.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string);
            (args, message)
        }
        other => (other.clone(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_constraint_specs_are_wrapped() {
        let raw = RawSchema::from_json(&json!({
            "precio": {
                "type": "FLOAT",
                "validate": {
                    "min": 0,
                    "max": { "args": [100], "msg": "too expensive" },
                    "notEmpty": { "msg": "empty" }
                }
            }
        }))
        .unwrap();
        let RawSchema::Object(obj) = raw else {
            panic!("expected object node")
        };
        let RawSchema::Field(field) = &obj.fields[0].1 else {
            panic!("expected field node")
        };
        let names: Vec<_> = field.constraints().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["min", "max", "notEmpty"]);
        assert!(matches!(&field.constraints()[0].rule, ConstraintRule::Args(v) if *v == json!(0)));
        assert_eq!(field.constraints()[1].message.as_deref(), Some("too expensive"));
        assert!(matches!(&field.constraints()[2].rule, ConstraintRule::Args(v) if *v == json!(true)));
    }

    #[test]
    fn object_with_a_type_child_is_not_a_field() {
        let raw = RawSchema::from_json(&json!({
            "type": { "type": "STRING" }
        }))
        .unwrap();
        assert!(matches!(raw, RawSchema::Object(_)));
    }

    #[test]
    fn multi_element_array_template_is_rejected() {
        let err = RawSchema::from_json(&json!({ "tags": [{ "type": "STRING" }, {}] })).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidNode { ref path, .. } if path == "tags"));
    }

    #[test]
    fn scalar_node_is_rejected() {
        let err = RawSchema::from_json(&json!({ "a": { "b": 3 } })).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidNode { ref path, .. } if path == "a.b"));
    }

    #[test]
    fn redeclared_constraint_keeps_position() {
        let f = FieldDef::new(DataType::STRING).min(1).max(5).min(2);
        assert_eq!(f.constraints().len(), 2);
        assert_eq!(f.constraints()[0].name, "min");
        assert!(matches!(&f.constraints()[0].rule, ConstraintRule::Args(v) if *v == json!(2)));
    }
}
