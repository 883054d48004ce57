//! Turning a [`RawSchema`] into an immutable, shareable [`BoundSchema`].
//!
//! Binding resolves data types, checks every constraint's arguments against
//! the evaluator and renders every message up front. The bound tree is then
//! read-only and can be validated against from any number of tasks.

use std::sync::Arc;

use serde_json::Value;

use crate::config::BindOptions;
use crate::data_type::DataType;
use crate::definition::{ConstraintRule, FieldDef, RawSchema, TypeSpec};
use crate::error::SchemaError;
use crate::evaluator::{ArgsProblem, ConstraintEvaluator, CustomCheck, StandardEvaluator};
use crate::i18n::{self, Catalog, MessageCatalog};

/// Bound schema node.
#[derive(Debug)]
pub enum SchemaNode {
    Leaf(LeafNode),
    Object(ObjectNode),
    Array(ArrayNode),
}

#[derive(Debug)]
pub struct LeafNode {
    pub(crate) data_type: DataType,
    pub(crate) allow_null: bool,
    pub(crate) null_message: String,
    pub(crate) type_message: String,
    pub(crate) constraints: Vec<BoundConstraint>,
}

impl LeafNode {
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn allow_null(&self) -> bool {
        self.allow_null
    }

    pub fn constraints(&self) -> &[BoundConstraint] {
        &self.constraints
    }
}

#[derive(Debug)]
pub struct BoundConstraint {
    pub(crate) name: String,
    pub(crate) check: BoundCheck,
}

impl BoundConstraint {
    pub fn name(&self) -> &str {
        &self.name
    }
}

pub(crate) enum BoundCheck {
    /// Evaluated by the schema's evaluator; `message` is fully rendered.
    Rule { args: Value, message: String },
    /// A per-field check; its explanation is appended to `prefix`.
    Custom {
        check: Arc<dyn CustomCheck>,
        prefix: Option<String>,
    },
}

impl std::fmt::Debug for BoundCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundCheck::Rule { args, message } => f
                .debug_struct("Rule")
                .field("args", args)
                .field("message", message)
                .finish(),
            BoundCheck::Custom { prefix, .. } => {
                f.debug_struct("Custom").field("prefix", prefix).finish()
            }
        }
    }
}

#[derive(Debug)]
pub struct ObjectNode {
    pub(crate) fields: Vec<(String, SchemaNode)>,
    pub(crate) shape_message: String,
}

impl ObjectNode {
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&SchemaNode> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, n)| n)
    }
}

#[derive(Debug)]
pub struct ArrayNode {
    pub(crate) element: Box<SchemaNode>,
    pub(crate) shape_message: String,
}

impl ArrayNode {
    pub fn element(&self) -> &SchemaNode {
        &self.element
    }
}

impl SchemaNode {
    /// Number of leaves in this subtree. An array template counts once.
    pub fn leaf_count(&self) -> usize {
        match self {
            SchemaNode::Leaf(_) => 1,
            SchemaNode::Object(o) => o.fields.iter().map(|(_, n)| n.leaf_count()).sum(),
            SchemaNode::Array(a) => a.element.leaf_count(),
        }
    }

    /// Value substituted for an array element that produced no result.
    pub(crate) fn empty_value(&self) -> Value {
        match self {
            SchemaNode::Object(_) => Value::Object(Default::default()),
            SchemaNode::Array(_) => Value::Array(vec![]),
            SchemaNode::Leaf(_) => Value::Null,
        }
    }
}

pub(crate) struct Inner {
    pub(crate) root: SchemaNode,
    pub(crate) evaluator: Arc<dyn ConstraintEvaluator>,
    pub(crate) options: BindOptions,
    /// Prefix for the root error `check_json` reports on unparseable input.
    pub(crate) parse_message: String,
}

/// A schema ready for repeated validation.
///
/// Cloning is cheap; all clones share one tree.
#[derive(Clone)]
pub struct BoundSchema {
    pub(crate) inner: Arc<Inner>,
}

impl std::fmt::Debug for BoundSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundSchema")
            .field("root", &self.inner.root)
            .field("options", &self.inner.options)
            .finish()
    }
}

impl BoundSchema {
    pub fn root(&self) -> &SchemaNode {
        &self.inner.root
    }

    pub fn options(&self) -> &BindOptions {
        &self.inner.options
    }
}

/// Binds raw schemas with a given evaluator, catalog and options.
///
/// # Example
/// ```
/// use reqvld::bind::SchemaBinder;
/// use reqvld::config::BindOptions;
///
/// let binder = SchemaBinder::new().with_options(BindOptions::default().locale("es"));
/// let schema = binder
///     .bind(&reqvld::object().field("titulo", reqvld::string().not_null()).into())
///     .unwrap();
/// assert_eq!(schema.root().leaf_count(), 1);
/// ```
#[derive(Clone)]
pub struct SchemaBinder {
    evaluator: Arc<dyn ConstraintEvaluator>,
    catalog: Arc<dyn MessageCatalog>,
    options: BindOptions,
}

impl Default for SchemaBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBinder {
    /// Standard evaluator, built-in catalog, default options.
    pub fn new() -> Self {
        Self {
            evaluator: Arc::new(StandardEvaluator::new()),
            catalog: Arc::new(Catalog::builtin()),
            options: BindOptions::default(),
        }
    }

    pub fn with_evaluator(mut self, evaluator: impl ConstraintEvaluator + 'static) -> Self {
        self.evaluator = Arc::new(evaluator);
        self
    }

    pub fn with_catalog(mut self, catalog: impl MessageCatalog + 'static) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    pub fn with_options(mut self, options: BindOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &BindOptions {
        &self.options
    }

    /// Bind `raw`. The raw definition is left untouched and can be bound
    /// again.
    pub fn bind(&self, raw: &RawSchema) -> Result<BoundSchema, SchemaError> {
        let root = self.bind_node(raw, "", "")?;
        tracing::debug!(
            leaves = root.leaf_count(),
            locale = %self.options.locale,
            "schema bound"
        );
        Ok(BoundSchema {
            inner: Arc::new(Inner {
                root,
                evaluator: Arc::clone(&self.evaluator),
                options: self.options.clone(),
                parse_message: self.render("", &self.options.model_name, "parse", &Value::Null),
            }),
        })
    }

    fn bind_node(&self, raw: &RawSchema, name: &str, path: &str) -> Result<SchemaNode, SchemaError> {
        match raw {
            RawSchema::Field(field) => self.bind_leaf(field, name, path).map(SchemaNode::Leaf),
            RawSchema::Object(obj) => {
                let fields = obj
                    .fields
                    .iter()
                    .map(|(key, child)| {
                        let child_path = join_path(path, key);
                        Ok((key.clone(), self.bind_node(child, key, &child_path)?))
                    })
                    .collect::<Result<Vec<_>, SchemaError>>()?;
                Ok(SchemaNode::Object(ObjectNode {
                    fields,
                    shape_message: self.render(name, &self.options.model_name, "isObject", &Value::Null),
                }))
            }
            RawSchema::Array(element) => Ok(SchemaNode::Array(ArrayNode {
                element: Box::new(self.bind_node(element, name, path)?),
                shape_message: self.render(name, &self.options.model_name, "isArray", &Value::Null),
            })),
        }
    }

    fn bind_leaf(&self, field: &FieldDef, name: &str, path: &str) -> Result<LeafNode, SchemaError> {
        let data_type = match &field.data_type {
            TypeSpec::Known(t) => *t,
            TypeSpec::Named(type_name) => {
                DataType::from_name(type_name).ok_or_else(|| SchemaError::UnknownDataType {
                    path: path.to_string(),
                    name: type_name.clone(),
                })?
            }
        };
        let model = field.model.as_deref().unwrap_or(&self.options.model_name);

        let mut constraints = Vec::with_capacity(field.constraints.len());
        for def in &field.constraints {
            let check = match &def.rule {
                ConstraintRule::Args(args) => {
                    self.evaluator
                        .check_args(&def.name, args)
                        .map_err(|problem| match problem {
                            ArgsProblem::Unknown => SchemaError::UnknownConstraint {
                                path: path.to_string(),
                                name: def.name.clone(),
                            },
                            ArgsProblem::Invalid(reason) => SchemaError::InvalidConstraintArgs {
                                path: path.to_string(),
                                name: def.name.clone(),
                                reason,
                            },
                        })?;
                    let message = match &def.message {
                        Some(msg) => msg.clone(),
                        None => self.render(name, model, &def.name, args),
                    };
                    BoundCheck::Rule {
                        args: args.clone(),
                        message,
                    }
                }
                ConstraintRule::Custom(check) => BoundCheck::Custom {
                    check: Arc::clone(check),
                    prefix: def.message.clone(),
                },
            };
            constraints.push(BoundConstraint {
                name: def.name.clone(),
                check,
            });
        }

        let null_message = match &field.allow_null_msg {
            Some(msg) => msg.clone(),
            None => self.render(name, model, i18n::ALLOW_NULL_KEY, &Value::Null),
        };
        let type_message = self.render(name, model, data_type.message_key(), &Value::Null);

        Ok(LeafNode {
            data_type,
            allow_null: field.allow_null,
            null_message,
            type_message,
            constraints,
        })
    }

    fn render(&self, name: &str, model: &str, key: &str, args: &Value) -> String {
        let template = i18n::resolve_template(self.catalog.as_ref(), key, &self.options.locale);
        i18n::render(&template, &i18n::message_params(name, model, args))
    }
}

pub(crate) fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf<'a>(schema: &'a BoundSchema, key: &str) -> &'a LeafNode {
        match schema.root() {
            SchemaNode::Object(o) => match o.get(key) {
                Some(SchemaNode::Leaf(l)) => l,
                other => panic!("expected leaf, got {other:?}"),
            },
            other => panic!("expected object root, got {other:?}"),
        }
    }

    #[test]
    fn messages_are_rendered_at_bind_time() {
        let raw: RawSchema = crate::object()
            .field("titulo", crate::string().not_null().len(0, 10))
            .into();
        let schema = SchemaBinder::new()
            .with_options(BindOptions::default().locale("es"))
            .bind(&raw)
            .unwrap();
        let titulo = leaf(&schema, "titulo");
        assert_eq!(titulo.null_message, "Se requiere el campo titulo");
        match &titulo.constraints[0].check {
            BoundCheck::Rule { message, .. } => {
                assert_eq!(message, "El campo titulo debe tener entre 0 y 10 caracteres.")
            }
            other => panic!("unexpected check {other:?}"),
        }
    }

    #[test]
    fn user_message_is_verbatim() {
        let raw: RawSchema = crate::object()
            .field("precio", crate::float().min_msg(0, "precio {{args}} no"))
            .into();
        let schema = SchemaBinder::new().bind(&raw).unwrap();
        match &leaf(&schema, "precio").constraints[0].check {
            BoundCheck::Rule { message, .. } => assert_eq!(message, "precio {{args}} no"),
            other => panic!("unexpected check {other:?}"),
        }
    }

    #[test]
    fn unknown_type_name_fails_with_path() {
        let raw = RawSchema::from_json(&json!({ "autor": { "foto": { "type": "BLOB" } } })).unwrap();
        let err = SchemaBinder::new().bind(&raw).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownDataType {
                path: "autor.foto".into(),
                name: "BLOB".into()
            }
        );
    }

    #[test]
    fn unknown_constraint_fails() {
        let raw: RawSchema = crate::object()
            .field("x", crate::string().constraint("isPalindrome", true))
            .into();
        let err = SchemaBinder::new().bind(&raw).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownConstraint { ref name, .. } if name == "isPalindrome"));
    }

    #[test]
    fn bad_regex_fails() {
        let raw: RawSchema = crate::object()
            .field("x", crate::string().matches("(unclosed"))
            .into();
        let err = SchemaBinder::new().bind(&raw).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidConstraintArgs { ref path, .. } if path == "x"));
    }

    #[test]
    fn array_template_reuses_parent_name() {
        let raw: RawSchema = crate::object()
            .field("tags", crate::array(crate::string().not_null()))
            .into();
        let schema = SchemaBinder::new().bind(&raw).unwrap();
        let SchemaNode::Object(root) = schema.root() else {
            panic!("expected object")
        };
        let Some(SchemaNode::Array(arr)) = root.get("tags") else {
            panic!("expected array")
        };
        let SchemaNode::Leaf(l) = arr.element() else {
            panic!("expected leaf element")
        };
        assert_eq!(l.null_message, "Field tags is required.");
        assert_eq!(schema.root().leaf_count(), 1);
    }

    #[test]
    fn bound_schema_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BoundSchema>();
    }
}
