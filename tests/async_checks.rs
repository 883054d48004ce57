use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqvld::definition::RawSchema;
use reqvld::prelude::*;
use serde_json::{json, Value};
use tokio::sync::Barrier;

fn slow_check(delay_ms: u64, reject: bool) -> impl Fn(Value) -> futures::future::BoxFuture<'static, Result<(), CheckError>> + Send + Sync {
    move |_v| {
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            if reject {
                Err(CheckError::Failed(format!("rejected after {delay_ms}ms")))
            } else {
                Ok(())
            }
        })
    }
}

#[tokio::test]
async fn errors_keep_declaration_order_not_completion_order() {
    let schema = reqvld::bind(
        &reqvld::object()
            .field("lento", reqvld::string().custom_async("slow", slow_check(60, true)))
            .field("medio", reqvld::string().custom_async("slow", slow_check(30, true)))
            .field("rapido", reqvld::string().custom_async("slow", slow_check(0, true)))
            .into(),
    )
    .unwrap();

    let out = schema
        .validate(Some(&json!({ "lento": "a", "medio": "b", "rapido": "c" })))
        .await
        .unwrap();
    assert_eq!(out.paths(), vec!["lento", "medio", "rapido"]);
    assert_eq!(out.errors[0].message, "rejected after 60ms");
}

#[tokio::test]
async fn siblings_run_concurrently() {
    // Each check waits for the other; only concurrent siblings can finish.
    let barrier = Arc::new(Barrier::new(2));
    let check = |barrier: Arc<Barrier>| {
        move |_v: Value| {
            let barrier = Arc::clone(&barrier);
            async move {
                barrier.wait().await;
                Ok::<(), CheckError>(())
            }
        }
    };
    let schema = reqvld::bind(
        &reqvld::object()
            .field("a", reqvld::string().custom_async("meet", check(Arc::clone(&barrier))))
            .field("b", reqvld::string().custom_async("meet", check(Arc::clone(&barrier))))
            .into(),
    )
    .unwrap();

    let out = tokio::time::timeout(
        Duration::from_secs(5),
        schema.validate(Some(&json!({ "a": "x", "b": "y" }))),
    )
    .await
    .expect("siblings did not run concurrently")
    .unwrap();
    assert!(out.is_valid());
}

#[tokio::test]
async fn sequential_mode_runs_one_leaf_at_a_time() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));
    let check = {
        let in_flight = Arc::clone(&in_flight);
        let max_seen = Arc::clone(&max_seen);
        move |_v: Value| {
            let in_flight = Arc::clone(&in_flight);
            let max_seen = Arc::clone(&max_seen);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok::<(), CheckError>(())
            }
        }
    };
    let raw: RawSchema = reqvld::object()
        .field(
            "items",
            reqvld::array(reqvld::integer().custom_async("track", check)),
        )
        .into();
    let schema = SchemaBinder::new()
        .with_options(BindOptions::default().concurrency(Concurrency::Sequential))
        .bind(&raw)
        .unwrap();

    let out = schema.validate(Some(&json!({ "items": [1, 2, 3, 4] }))).await.unwrap();
    assert!(out.is_valid());
    assert_eq!(max_seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn async_failure_is_a_field_error() {
    let taken = ["ana@example.com"];
    let schema = reqvld::bind(
        &reqvld::object()
            .field(
                "email",
                reqvld::string().is_email().custom_async("unique", move |v| async move {
                    tokio::task::yield_now().await;
                    match v.as_str() {
                        Some(email) if taken.contains(&email) => Err(CheckError::from("is already registered")),
                        _ => Ok(()),
                    }
                }),
            )
            .into(),
    )
    .unwrap();

    let err = schema.check(&json!({ "email": "ana@example.com" })).await.unwrap_err();
    let failure = err.as_validation().unwrap();
    assert_eq!(failure.errors[0].message, "is already registered");

    let ok = schema.check(&json!({ "email": "luis@example.com" })).await.unwrap();
    assert_eq!(ok, json!({ "email": "luis@example.com" }));
}

#[tokio::test]
async fn unexpected_fault_aborts_with_path() {
    let schema = reqvld::bind(
        &reqvld::object()
            .field("ok", reqvld::string().not_null())
            .field(
                "cuenta",
                reqvld::object().field(
                    "id",
                    reqvld::integer().custom_async("exists", |_v| async {
                        Err::<(), _>(CheckError::Unexpected("pool timed out".into()))
                    }),
                ),
            )
            .into(),
    )
    .unwrap();

    let err = schema.check(&json!({ "cuenta": { "id": 3 } })).await.unwrap_err();
    assert_eq!(err.status_code(), 500);
    match err {
        Error::Unexpected(e) => {
            assert_eq!(e.path, "cuenta.id");
            assert_eq!(e.constraint, "exists");
            assert_eq!(e.source.to_string(), "pool timed out");
        }
        other => panic!("expected unexpected error, got {other:?}"),
    }
}

#[tokio::test]
async fn custom_evaluator_can_suspend() {
    struct RemoteEvaluator;

    impl ConstraintEvaluator for RemoteEvaluator {
        fn check_args(&self, name: &str, _args: &Value) -> Result<(), reqvld::evaluator::ArgsProblem> {
            match name {
                "inStock" => Ok(()),
                _ => Err(reqvld::evaluator::ArgsProblem::Unknown),
            }
        }

        fn evaluate<'a>(
            &'a self,
            _name: &'a str,
            value: &'a Value,
            _args: &'a Value,
        ) -> futures::future::BoxFuture<'a, Result<Verdict, reqvld::evaluator::BoxError>> {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(1)).await;
                Ok(Verdict::from_bool(value.as_i64() != Some(0), "outOfStock"))
            })
        }
    }

    let raw: RawSchema = reqvld::object()
        .field("sku", reqvld::integer().constraint_msg("inStock", true, "sin stock"))
        .into();
    let schema = SchemaBinder::new().with_evaluator(RemoteEvaluator).bind(&raw).unwrap();

    let out = schema.validate(Some(&json!({ "sku": 0 }))).await.unwrap();
    assert_eq!(out.errors[0].message, "sin stock");

    let err = SchemaBinder::new()
        .with_evaluator(RemoteEvaluator)
        .bind(&reqvld::object().field("sku", reqvld::integer().min(1)).into())
        .unwrap_err();
    assert!(matches!(err, SchemaError::UnknownConstraint { .. }));
}
