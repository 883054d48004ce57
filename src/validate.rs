//! The recursive validator.
//!
//! Walks a bound schema and a JSON value in lockstep. Every leaf is visited
//! even after earlier failures, so one pass reports every problem. Errors
//! come out in schema declaration order, array elements in index order.

use futures::future::{join_all, BoxFuture, FutureExt};
use serde_json::{Map, Value};

use crate::bind::{join_path, ArrayNode, BoundCheck, BoundSchema, LeafNode, ObjectNode, SchemaNode};
use crate::config::{Concurrency, ShapePolicy};
use crate::error::{truncate_value, Error, FieldError, UnexpectedError, ValidationFailure};
use crate::evaluator::{CheckError, Verdict};
use crate::input::JsonInput;
use crate::outcome::{aggregate, ValidationOutcome};

type NodeFuture<'a> = BoxFuture<'a, Result<ValidationOutcome, UnexpectedError>>;

impl BoundSchema {
    /// Validate `value` against the whole schema. `None` means the value is
    /// absent.
    ///
    /// Constraint failures end up in the outcome; only evaluator faults are
    /// returned as errors.
    pub async fn validate(&self, value: Option<&Value>) -> Result<ValidationOutcome, UnexpectedError> {
        self.validate_at(value, "").await
    }

    /// Like [`validate`](Self::validate), with every error path prefixed by
    /// `path`.
    pub async fn validate_at(
        &self,
        value: Option<&Value>,
        path: &str,
    ) -> Result<ValidationOutcome, UnexpectedError> {
        self.visit(&self.inner.root, value, path.to_string()).await
    }

    /// Validate and aggregate: the sanitized value, or the failure.
    ///
    /// ```
    /// use serde_json::json;
    ///
    /// let schema = reqvld::bind(
    ///     &reqvld::object()
    ///         .field("titulo", reqvld::string().not_null())
    ///         .field("precio", reqvld::float().min(0))
    ///         .into(),
    /// )
    /// .unwrap();
    ///
    /// let err = schema.check_blocking(&json!({ "precio": -124 })).unwrap_err();
    /// assert_eq!(err.as_validation().unwrap().paths(), vec!["titulo", "precio"]);
    /// ```
    pub async fn check(&self, value: &Value) -> Result<Value, Error> {
        let outcome = self.validate(Some(value)).await?;
        Ok(aggregate(outcome)?)
    }

    /// [`check`](Self::check) driven to completion on the current thread.
    pub fn check_blocking(&self, value: &Value) -> Result<Value, Error> {
        futures::executor::block_on(self.check(value))
    }

    /// Parse JSON text, bytes or a value, then [`check`](Self::check) it.
    ///
    /// Unparseable input fails validation with one error at the root path.
    pub async fn check_json<I: JsonInput + ?Sized>(&self, input: &I) -> Result<Value, Error> {
        let value = match input.to_json_value() {
            Ok(value) => value,
            Err(e) => {
                tracing::trace!(error = %e, "input is not valid JSON");
                let message = format!("{} {e}", self.inner.parse_message);
                return Err(ValidationFailure::new(vec![FieldError::new("", Value::Null, message)]).into());
            }
        };
        self.check(&value).await
    }

    fn visit<'a>(&'a self, node: &'a SchemaNode, value: Option<&'a Value>, path: String) -> NodeFuture<'a> {
        match node {
            SchemaNode::Leaf(leaf) => self.visit_leaf(leaf, value, path).boxed(),
            SchemaNode::Object(obj) => self.visit_object(obj, value, path).boxed(),
            SchemaNode::Array(arr) => self.visit_array(arr, value, path).boxed(),
        }
    }

    async fn visit_leaf(
        &self,
        leaf: &LeafNode,
        value: Option<&Value>,
        path: String,
    ) -> Result<ValidationOutcome, UnexpectedError> {
        let value = match value {
            None | Some(Value::Null) if !leaf.allow_null => {
                tracing::trace!(%path, "missing required value");
                return Ok(ValidationOutcome::failed(vec![FieldError::new(
                    path,
                    Value::Null,
                    leaf.null_message.clone(),
                )]));
            }
            None => return Ok(ValidationOutcome::ok(None)),
            Some(Value::Null) => return Ok(ValidationOutcome::ok(Some(Value::Null))),
            Some(v) => v,
        };

        let mut errors = Vec::new();
        for constraint in &leaf.constraints {
            let failure = match &constraint.check {
                BoundCheck::Rule { args, message } => {
                    match self.inner.evaluator.evaluate(&constraint.name, value, args).await {
                        Ok(Verdict::Pass) => None,
                        Ok(Verdict::Fail { key }) => {
                            tracing::trace!(%path, constraint = %constraint.name, %key, "constraint failed");
                            Some(message.clone())
                        }
                        Err(source) => return Err(self.unexpected(&path, &constraint.name, source)),
                    }
                }
                BoundCheck::Custom { check, prefix } => match check.check(value).await {
                    Ok(()) => None,
                    Err(CheckError::Failed(explanation)) => {
                        tracing::trace!(%path, constraint = %constraint.name, "custom check failed");
                        Some(match prefix {
                            Some(prefix) => format!("{prefix} {explanation}"),
                            None => explanation,
                        })
                    }
                    Err(CheckError::Unexpected(source)) => {
                        return Err(self.unexpected(&path, &constraint.name, source))
                    }
                },
            };
            if let Some(message) = failure {
                errors.push(FieldError::new(path.clone(), self.received(value), message));
            }
        }
        if !errors.is_empty() {
            return Ok(ValidationOutcome::failed(errors));
        }

        match leaf.data_type.coerce(value) {
            Some(coerced) => Ok(ValidationOutcome::ok(Some(coerced))),
            None => {
                tracing::trace!(%path, data_type = %leaf.data_type, "coercion failed");
                Ok(ValidationOutcome::failed(vec![FieldError::new(
                    path,
                    self.received(value),
                    leaf.type_message.clone(),
                )]))
            }
        }
    }

    async fn visit_object(
        &self,
        obj: &ObjectNode,
        value: Option<&Value>,
        path: String,
    ) -> Result<ValidationOutcome, UnexpectedError> {
        let map = match value {
            None | Some(Value::Null) => return Ok(ValidationOutcome::ok(None)),
            Some(Value::Object(map)) => Some(map),
            Some(other) => match self.inner.options.shape_policy {
                ShapePolicy::Strict => return Ok(self.shape_error(path, other, &obj.shape_message)),
                ShapePolicy::Lenient => None,
            },
        };

        let children = obj
            .fields
            .iter()
            .map(|(key, child)| {
                let child_value = map.and_then(|m| m.get(key));
                self.visit(child, child_value, join_path(&path, key))
            })
            .collect::<Vec<NodeFuture<'_>>>();
        let outcomes = self.drive(children).await?;

        let mut errors = Vec::new();
        let mut result = Map::new();
        for ((key, _), outcome) in obj.fields.iter().zip(outcomes) {
            errors.extend(outcome.errors);
            if let Some(v) = outcome.result {
                result.insert(key.clone(), v);
            }
        }
        Ok(finish(errors, Value::Object(result)))
    }

    async fn visit_array(
        &self,
        arr: &ArrayNode,
        value: Option<&Value>,
        path: String,
    ) -> Result<ValidationOutcome, UnexpectedError> {
        let items: &[Value] = match value {
            None | Some(Value::Null) => &[],
            Some(Value::Array(items)) => items,
            Some(other) => match self.inner.options.shape_policy {
                ShapePolicy::Strict => return Ok(self.shape_error(path, other, &arr.shape_message)),
                ShapePolicy::Lenient => &[],
            },
        };

        let elements = items
            .iter()
            .map(|item| self.visit(&arr.element, Some(item), path.clone()))
            .collect::<Vec<NodeFuture<'_>>>();
        let outcomes = self.drive(elements).await?;

        let mut errors = Vec::new();
        let mut result = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            errors.extend(outcome.errors);
            result.push(outcome.result.unwrap_or_else(|| arr.element.empty_value()));
        }
        Ok(finish(errors, Value::Array(result)))
    }

    /// Run sibling futures according to the configured concurrency. Results
    /// are returned in input order either way.
    async fn drive<'a, I>(&self, futures: I) -> Result<Vec<ValidationOutcome>, UnexpectedError>
    where
        I: IntoIterator<Item = NodeFuture<'a>>,
    {
        match self.inner.options.concurrency {
            Concurrency::Concurrent => join_all(futures).await.into_iter().collect(),
            Concurrency::Sequential => {
                let mut outcomes = Vec::new();
                for fut in futures {
                    outcomes.push(fut.await?);
                }
                Ok(outcomes)
            }
        }
    }

    fn received(&self, value: &Value) -> Value {
        match self.inner.options.max_received_len {
            Some(limit) => truncate_value(value, limit),
            None => value.clone(),
        }
    }

    fn shape_error(&self, path: String, value: &Value, message: &str) -> ValidationOutcome {
        tracing::trace!(%path, "shape mismatch");
        ValidationOutcome::failed(vec![FieldError::new(path, self.received(value), message)])
    }

    fn unexpected(&self, path: &str, constraint: &str, source: crate::evaluator::BoxError) -> UnexpectedError {
        tracing::warn!(%path, %constraint, error = %source, "constraint check failed unexpectedly");
        UnexpectedError {
            path: path.to_string(),
            constraint: constraint.to_string(),
            source,
        }
    }
}

fn finish(errors: Vec<FieldError>, result: Value) -> ValidationOutcome {
    if errors.is_empty() {
        ValidationOutcome::ok(Some(result))
    } else {
        ValidationOutcome::failed(errors)
    }
}
