use reqvld::definition::RawSchema;
use reqvld::prelude::*;
use serde_json::{json, Value};

fn failure() -> ValidationFailure {
    let schema = reqvld::bind(
        &reqvld::object()
            .field("titulo", reqvld::string().not_null().len(3, 50))
            .field(
                "autor",
                reqvld::object().field("email", reqvld::string().is_email().contains("@editorial")),
            )
            .into(),
    )
    .unwrap();
    let err = schema
        .check_blocking(&json!({ "titulo": "ab", "autor": { "email": "nope" } }))
        .unwrap_err();
    err.as_validation().unwrap().clone()
}

#[test]
fn prettify_failure() {
    let pretty = prettify_errors(&failure());
    assert!(pretty.contains("✖"));
    assert!(pretty.contains("→ at titulo, received \"ab\""));
    assert!(pretty.contains("→ at autor.email"));
    assert_eq!(pretty.matches('✖').count(), 3);
}

#[test]
fn flatten_failure() {
    let flat = flatten_errors(&failure());
    assert!(flat.form_errors.is_empty());
    assert_eq!(flat.field_errors["titulo"].len(), 1);
    assert_eq!(
        flat.field_errors["autor.email"],
        vec![
            "Field email must be a valid email address.",
            "Field email must contain @editorial."
        ]
    );
}

#[test]
fn payload_is_the_transport_body() {
    let payload = to_payload(&failure());
    assert_eq!(payload["name"], "InputDataValidationError");
    assert_eq!(
        payload["errors"][0],
        json!({
            "path": "titulo",
            "value": "ab",
            "msg": "Field titulo must have between 3 and 50 characters."
        })
    );
    assert_eq!(payload["errors"].as_array().unwrap().len(), 3);
}

#[test]
fn failure_display_lists_paths() {
    let text = failure().to_string();
    assert!(text.contains("titulo"));
    assert!(text.contains("autor.email"));
}

#[test]
fn long_rejected_values_are_truncated() {
    let schema = SchemaBinder::new()
        .with_options(BindOptions::default().max_received_len(8))
        .bind(&reqvld::object().field("codigo", reqvld::string().len(1, 4)).into())
        .unwrap();
    let err = schema
        .check_blocking(&json!({ "codigo": "ABCDEFGHIJKLMNOP" }))
        .unwrap_err();
    let failure = err.as_validation().unwrap();
    assert_eq!(failure.errors[0].value, json!("ABCDE..."));
}

fn tags_schema(options: BindOptions) -> BoundSchema {
    let raw = RawSchema::from_json(&json!({
        "tags": { "type": "ARRAY(INTEGER)", "validate": { "len": [0, 3] } },
        "codigo": { "type": "STRING", "validate": { "len": [1, 4] } }
    }))
    .unwrap();
    SchemaBinder::new().with_options(options).bind(&raw).unwrap()
}

fn rejected(schema: &BoundSchema, input: Value) -> Vec<Value> {
    let err = schema.check_blocking(&input).unwrap_err();
    err.as_validation().unwrap().errors.iter().map(|e| e.value.clone()).collect()
}

#[test]
fn rejected_values_are_reported_unchanged_by_default() {
    let schema = tags_schema(BindOptions::default());
    let long = "x".repeat(150);
    let got = rejected(&schema, json!({ "tags": [1, 2, 3, 4, 5, 6], "codigo": long.clone() }));
    assert_eq!(got, vec![json!([1, 2, 3, 4, 5, 6]), json!(long)]);
}

#[test]
fn configured_limit_applies_to_arrays() {
    let schema = tags_schema(BindOptions::default().max_received_len(3));
    let got = rejected(&schema, json!({ "tags": [1, 2, 3, 4, 5, 6], "codigo": "ABCDEFG" }));
    assert_eq!(got, vec![json!([1, 2, 3, "... (3 more)"]), json!("...")]);

    let schema = tags_schema(BindOptions::default().max_received_len(1000));
    let got = rejected(&schema, json!({ "tags": [1, 2, 3, 4, 5, 6] }));
    assert_eq!(got, vec![json!([1, 2, 3, 4, 5, 6])]);
}

#[test]
fn failures_serialize_with_msg_key() {
    let failure = failure();
    let v = serde_json::to_value(&failure.errors[1]).unwrap();
    assert_eq!(v["path"], "autor.email");
    assert_eq!(v["msg"], "Field email must be a valid email address.");
    assert!(v.get("message").is_none());
}
