//! Constraint evaluation capability.
//!
//! The validator owns traversal and error shape; what a constraint *means*
//! is delegated to a [`ConstraintEvaluator`]. [`StandardEvaluator`] covers
//! the usual string, number, membership and format rules. Per-field closures
//! plug in through [`CustomCheck`].

use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;

pub mod format;
mod standard;

pub use standard::StandardEvaluator;

/// Boxed error used for unexpected evaluator faults.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of evaluating one constraint against one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    /// The value breaks the constraint. `key` is a machine-readable reason.
    Fail { key: String },
}

impl Verdict {
    pub fn fail(key: impl Into<String>) -> Self {
        Verdict::Fail { key: key.into() }
    }

    pub fn from_bool(ok: bool, key: &str) -> Self {
        if ok {
            Verdict::Pass
        } else {
            Verdict::fail(key)
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// Why a constraint definition cannot be bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgsProblem {
    /// The evaluator does not know this constraint name.
    Unknown,
    /// The arguments cannot be used with this constraint.
    Invalid(String),
}

/// Evaluates named, parameterized constraints.
///
/// `check_args` runs once per constraint while a schema is bound, so a bad
/// definition surfaces at startup. `evaluate` runs per request and may
/// suspend; an `Err` means the evaluator itself failed, not the value.
pub trait ConstraintEvaluator: Send + Sync {
    fn check_args(&self, name: &str, args: &Value) -> Result<(), ArgsProblem>;

    fn evaluate<'a>(
        &'a self,
        name: &'a str,
        value: &'a Value,
        args: &'a Value,
    ) -> BoxFuture<'a, Result<Verdict, BoxError>>;
}

impl<E: ConstraintEvaluator + ?Sized> ConstraintEvaluator for Arc<E> {
    fn check_args(&self, name: &str, args: &Value) -> Result<(), ArgsProblem> {
        (**self).check_args(name, args)
    }

    fn evaluate<'a>(
        &'a self,
        name: &'a str,
        value: &'a Value,
        args: &'a Value,
    ) -> BoxFuture<'a, Result<Verdict, BoxError>> {
        (**self).evaluate(name, value, args)
    }
}

/// Failure reported by a [`CustomCheck`].
#[derive(Debug)]
pub enum CheckError {
    /// The value was rejected; the string explains why.
    Failed(String),
    /// The check could not run (I/O failure, bug, ...).
    Unexpected(BoxError),
}

impl From<String> for CheckError {
    fn from(msg: String) -> Self {
        CheckError::Failed(msg)
    }
}

impl From<&str> for CheckError {
    fn from(msg: &str) -> Self {
        CheckError::Failed(msg.to_string())
    }
}

/// A user-supplied constraint attached to a single field.
pub trait CustomCheck: Send + Sync {
    fn check<'a>(&'a self, value: &'a Value) -> BoxFuture<'a, Result<(), CheckError>>;
}

/// Synchronous closure adapter. Created via `FieldDef::custom`.
pub struct FnCheck<F>(pub F);

impl<F> CustomCheck for FnCheck<F>
where
    F: Fn(&Value) -> Result<(), String> + Send + Sync,
{
    fn check<'a>(&'a self, value: &'a Value) -> BoxFuture<'a, Result<(), CheckError>> {
        future::ready((self.0)(value).map_err(CheckError::Failed)).boxed()
    }
}

/// Asynchronous closure adapter. Created via `FieldDef::custom_async`.
pub struct AsyncFnCheck<F>(pub F);

impl<F, Fut> CustomCheck for AsyncFnCheck<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CheckError>> + Send + 'static,
{
    fn check<'a>(&'a self, value: &'a Value) -> BoxFuture<'a, Result<(), CheckError>> {
        (self.0)(value.clone()).boxed()
    }
}
