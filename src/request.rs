//! Validating the partitions of an HTTP request.
//!
//! A request is split into `body`, `headers`, `params` and `query`. Each
//! declared partition is validated against its own bound schema with error
//! paths prefixed by the partition name (`body.titulo`). On success the
//! sanitized trees replace the original partitions, except `headers`, which
//! keep their transport values.

use std::fmt;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::bind::{join_path, BoundSchema, SchemaBinder};
use crate::definition::RawSchema;
use crate::error::{Error, FieldError, SchemaError, UnexpectedError, ValidationFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Body,
    Headers,
    Params,
    Query,
}

impl Partition {
    pub const ALL: [Partition; 4] = [
        Partition::Body,
        Partition::Headers,
        Partition::Params,
        Partition::Query,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Body => "body",
            Partition::Headers => "headers",
            Partition::Params => "params",
            Partition::Query => "query",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// The four partitions of an incoming request, each an already parsed JSON
/// value. Missing partitions default to `{}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestInput {
    pub body: Value,
    pub headers: Value,
    pub params: Value,
    pub query: Value,
}

impl Default for RequestInput {
    fn default() -> Self {
        Self {
            body: empty_object(),
            headers: empty_object(),
            params: empty_object(),
            query: empty_object(),
        }
    }
}

impl RequestInput {
    pub fn get(&self, partition: Partition) -> &Value {
        match partition {
            Partition::Body => &self.body,
            Partition::Headers => &self.headers,
            Partition::Params => &self.params,
            Partition::Query => &self.query,
        }
    }

    pub fn get_mut(&mut self, partition: Partition) -> &mut Value {
        match partition {
            Partition::Body => &mut self.body,
            Partition::Headers => &mut self.headers,
            Partition::Params => &mut self.params,
            Partition::Query => &mut self.query,
        }
    }
}

/// Per-partition outcome of [`RequestSchema::validate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOutcome {
    /// Errors of every partition, in partition declaration order.
    pub errors: Vec<FieldError>,
    pub results: Vec<(Partition, Option<Value>)>,
}

impl RequestOutcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Replace the declared partitions of `input` with their sanitized
    /// values, or return every error. `headers` are never replaced.
    pub fn apply(self, input: &mut RequestInput) -> Result<(), ValidationFailure> {
        if !self.errors.is_empty() {
            return Err(ValidationFailure::new(self.errors));
        }
        for (partition, result) in self.results {
            if partition == Partition::Headers {
                continue;
            }
            if let Some(value) = result {
                *input.get_mut(partition) = value;
            }
        }
        Ok(())
    }
}

/// One bound schema per declared request partition.
///
/// # Example
/// ```
/// use reqvld::request::{RequestInput, RequestSchema};
/// use serde_json::json;
///
/// let schema = RequestSchema::new().body(
///     reqvld::bind(&reqvld::object().field("titulo", reqvld::string().not_null()).into()).unwrap(),
/// );
/// let mut input = RequestInput { body: json!({}), ..Default::default() };
/// let err = schema.check_blocking(&mut input).unwrap_err();
/// assert_eq!(err.as_validation().unwrap().paths(), vec!["body.titulo"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestSchema {
    partitions: Vec<(Partition, BoundSchema)>,
}

impl RequestSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the schema of a partition. Declaring a partition again
    /// replaces its schema in place.
    pub fn partition(mut self, partition: Partition, schema: BoundSchema) -> Self {
        match self.partitions.iter_mut().find(|(p, _)| *p == partition) {
            Some(slot) => slot.1 = schema,
            None => self.partitions.push((partition, schema)),
        }
        self
    }

    pub fn body(self, schema: BoundSchema) -> Self {
        self.partition(Partition::Body, schema)
    }

    pub fn headers(self, schema: BoundSchema) -> Self {
        self.partition(Partition::Headers, schema)
    }

    pub fn params(self, schema: BoundSchema) -> Self {
        self.partition(Partition::Params, schema)
    }

    pub fn query(self, schema: BoundSchema) -> Self {
        self.partition(Partition::Query, schema)
    }

    /// Bind a declarative document of the form
    /// `{ "body": {..}, "params": {..}, ... }`.
    pub fn from_json(binder: &SchemaBinder, document: &Value) -> Result<Self, SchemaError> {
        let Value::Object(map) = document else {
            return Err(SchemaError::InvalidNode {
                path: String::new(),
                reason: "a request schema must be an object of partitions".to_string(),
            });
        };
        let mut schema = Self::new();
        for (name, raw) in map {
            let partition = Partition::from_name(name).ok_or_else(|| SchemaError::InvalidNode {
                path: name.clone(),
                reason: "expected one of body, headers, params, query".to_string(),
            })?;
            let raw = RawSchema::from_json(raw).map_err(|e| in_partition(e, name))?;
            let bound = binder.bind(&raw).map_err(|e| in_partition(e, name))?;
            schema = schema.partition(partition, bound);
        }
        Ok(schema)
    }

    pub fn declared(&self) -> impl Iterator<Item = Partition> + '_ {
        self.partitions.iter().map(|(p, _)| *p)
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Validate every declared partition. Partitions run concurrently and
    /// their errors are merged in declaration order.
    pub async fn validate(&self, input: &RequestInput) -> Result<RequestOutcome, UnexpectedError> {
        let runs = self.partitions.iter().map(|(partition, schema)| {
            schema.validate_at(Some(input.get(*partition)), partition.as_str())
        });
        let outcomes = join_all(runs).await;

        let mut merged = RequestOutcome::default();
        for ((partition, _), outcome) in self.partitions.iter().zip(outcomes) {
            let outcome = outcome?;
            merged.errors.extend(outcome.errors);
            merged.results.push((*partition, outcome.result));
        }
        Ok(merged)
    }

    /// Validate and, on success, replace the declared partitions of `input`.
    pub async fn check(&self, input: &mut RequestInput) -> Result<(), Error> {
        let outcome = self.validate(input).await?;
        if !outcome.is_valid() {
            tracing::debug!(errors = outcome.errors.len(), "request rejected");
        }
        outcome.apply(input)?;
        Ok(())
    }

    pub fn check_blocking(&self, input: &mut RequestInput) -> Result<(), Error> {
        futures::executor::block_on(self.check(input))
    }
}

/// Re-root a schema error found inside `partition`.
fn in_partition(err: SchemaError, partition: &str) -> SchemaError {
    let prefix = |path: String| {
        if path.is_empty() {
            partition.to_string()
        } else {
            join_path(partition, &path)
        }
    };
    match err {
        SchemaError::UnknownDataType { path, name } => SchemaError::UnknownDataType {
            path: prefix(path),
            name,
        },
        SchemaError::UnknownConstraint { path, name } => SchemaError::UnknownConstraint {
            path: prefix(path),
            name,
        },
        SchemaError::InvalidConstraintArgs { path, name, reason } => {
            SchemaError::InvalidConstraintArgs {
                path: prefix(path),
                name,
                reason,
            }
        }
        SchemaError::InvalidNode { path, reason } => SchemaError::InvalidNode {
            path: prefix(path),
            reason,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> RequestSchema {
        RequestSchema::from_json(
            &SchemaBinder::new(),
            &json!({
                "params": { "id": { "type": "INTEGER", "allowNull": false } },
                "body": {
                    "titulo": { "type": "STRING", "allowNull": false },
                    "precio": { "type": "FLOAT", "validate": { "min": 0 } }
                },
                "headers": { "authorization": { "type": "STRING", "allowNull": false } }
            }),
        )
        .unwrap()
    }

    #[test]
    fn errors_are_prefixed_and_merged_in_order() {
        let mut input = RequestInput {
            body: json!({ "precio": -124 }),
            ..Default::default()
        };
        let err = schema().check_blocking(&mut input).unwrap_err();
        assert_eq!(
            err.as_validation().unwrap().paths(),
            vec!["params.id", "body.titulo", "body.precio", "headers.authorization"]
        );
    }

    #[test]
    fn apply_replaces_everything_but_headers() {
        let mut input = RequestInput {
            params: json!({ "id": "7" }),
            body: json!({ "titulo": "Rayuela", "extra": true }),
            headers: json!({ "authorization": "Bearer x", "host": "localhost" }),
            query: json!({ "page": "2" }),
        };
        schema().check_blocking(&mut input).unwrap();
        assert_eq!(input.params, json!({ "id": 7 }));
        assert_eq!(input.body, json!({ "titulo": "Rayuela" }));
        assert_eq!(input.headers["host"], "localhost");
        assert_eq!(input.query, json!({ "page": "2" }));
    }

    #[test]
    fn unknown_partition_is_rejected() {
        let err = RequestSchema::from_json(&SchemaBinder::new(), &json!({ "cookies": {} })).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidNode { ref path, .. } if path == "cookies"));
    }

    #[test]
    fn nested_invalid_node_is_prefixed() {
        let err = RequestSchema::from_json(&SchemaBinder::new(), &json!({ "body": { "tags": [] } })).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidNode { ref path, .. } if path == "body.tags"));

        let err = RequestSchema::from_json(
            &SchemaBinder::new(),
            &json!({ "query": { "page": { "type": "INTEGER", "validate": { "min": "uno" } } } }),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidConstraintArgs { ref path, .. } if path == "query.page"));
    }
}
