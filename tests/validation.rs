use reqvld::definition::RawSchema;
use reqvld::prelude::*;
use serde_json::{json, Value};

fn bind(raw: impl Into<RawSchema>) -> BoundSchema {
    reqvld::bind(&raw.into()).unwrap()
}

fn validate(schema: &BoundSchema, value: Value) -> ValidationOutcome {
    futures::executor::block_on(schema.validate(Some(&value))).unwrap()
}

fn libro() -> ObjectDef {
    reqvld::object()
        .field("titulo", reqvld::string().not_null())
        .field("precio", reqvld::float().min(0))
}

// ---------------------------------------------------------------------------
// Leaves
// ---------------------------------------------------------------------------

#[test]
fn two_invalid_leaves_give_two_errors() {
    let schema = bind(libro());
    let out = validate(&schema, json!({ "precio": -124 }));

    assert_eq!(out.errors.len(), 2);
    assert_eq!(out.errors[0].path, "titulo");
    assert_eq!(out.errors[0].message, "Field titulo is required.");
    assert_eq!(out.errors[0].value, Value::Null);
    assert_eq!(out.errors[1].path, "precio");
    assert_eq!(out.errors[1].message, "Field precio must be greater than or equal to 0.");
    assert_eq!(out.errors[1].value, json!(-124));
    assert!(out.result.is_none());
}

#[test]
fn explicit_null_on_required_field_is_an_error() {
    let schema = bind(libro());
    let out = validate(&schema, json!({ "titulo": null }));
    assert_eq!(out.paths(), vec!["titulo"]);
}

#[test]
fn omitted_optional_field_has_no_result_key() {
    let schema = bind(libro());
    let out = validate(&schema, json!({ "titulo": "Rayuela" }));
    assert!(out.is_valid());
    assert_eq!(out.result, Some(json!({ "titulo": "Rayuela" })));
}

#[test]
fn well_typed_input_round_trips_with_unknown_keys_stripped() {
    let schema = bind(
        libro()
            .field("paginas", reqvld::integer())
            .field("disponible", reqvld::boolean())
            .field("publicado", reqvld::date_only()),
    );
    let input = json!({
        "titulo": "Rayuela",
        "precio": 11.5,
        "paginas": 600,
        "disponible": true,
        "publicado": "1963-06-28",
        "isbn": "978-84-376-0494-7"
    });
    let out = validate(&schema, input.clone());
    assert!(out.is_valid());

    let mut expected = input;
    expected.as_object_mut().unwrap().remove("isbn");
    assert_eq!(out.result, Some(expected));
}

#[test]
fn declared_types_are_coerced() {
    let schema = bind(
        reqvld::object()
            .field("paginas", reqvld::integer())
            .field("publicado", reqvld::date())
            .field("tags", reqvld::array_of(ScalarType::Integer)),
    );
    let out = validate(
        &schema,
        json!({ "paginas": "600", "publicado": "1963-06-28", "tags": ["1", 2] }),
    );
    assert_eq!(
        out.result,
        Some(json!({ "paginas": 600, "publicado": "1963-06-28T00:00:00.000Z", "tags": [1, 2] }))
    );
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

fn autor() -> ObjectDef {
    reqvld::object().field(
        "autor",
        reqvld::object().field(
            "persona",
            reqvld::object().field("nombre", reqvld::string().not_null()),
        ),
    )
}

#[test]
fn nested_paths_are_dotted() {
    let schema = bind(autor());
    let out = validate(&schema, json!({ "autor": { "persona": {} } }));
    assert_eq!(out.paths(), vec!["autor.persona.nombre"]);
}

#[test]
fn absent_nested_object_is_valid() {
    let schema = bind(autor());

    let out = validate(&schema, json!({ "autor": {} }));
    assert!(out.is_valid());
    assert_eq!(out.result, Some(json!({ "autor": {} })));

    let out = validate(&schema, json!({}));
    assert!(out.is_valid());
    assert_eq!(out.result, Some(json!({})));
}

#[test]
fn absent_root_has_no_result() {
    let schema = bind(autor());
    let out = futures::executor::block_on(schema.validate(None)).unwrap();
    assert_eq!(out, ValidationOutcome::ok(None));
}

// ---------------------------------------------------------------------------
// Arrays
// ---------------------------------------------------------------------------

fn autores() -> ObjectDef {
    reqvld::object().field(
        "autores",
        reqvld::array(reqvld::object().field("nombre", reqvld::string().not_null())),
    )
}

#[test]
fn omitted_array_is_empty_and_valid() {
    let schema = bind(autores());
    let out = validate(&schema, json!({}));
    assert!(out.is_valid());
    assert_eq!(out.result, Some(json!({ "autores": [] })));

    let out = validate(&schema, json!({ "autores": null }));
    assert_eq!(out.result, Some(json!({ "autores": [] })));
}

#[test]
fn single_empty_element_reports_key_without_index() {
    let schema = bind(autores());
    let out = validate(&schema, json!({ "autores": [{}] }));
    assert_eq!(out.errors.len(), 1);
    assert_eq!(out.errors[0].path, "autores.nombre");
}

#[test]
fn element_errors_come_in_index_order() {
    let schema = bind(reqvld::object().field(
        "autores",
        reqvld::array(reqvld::object().field("edad", reqvld::integer().min(0))),
    ));
    let out = validate(
        &schema,
        json!({ "autores": [{ "edad": 1 }, { "edad": -1 }, { "edad": 2 }, { "edad": -2 }] }),
    );
    let values: Vec<&Value> = out.errors.iter().map(|e| &e.value).collect();
    assert_eq!(values, vec![&json!(-1), &json!(-2)]);
    assert!(out.paths().iter().all(|p| *p == "autores.edad"));
}

#[test]
fn null_elements_are_filled_with_the_template_empty_value() {
    let schema = bind(
        reqvld::object()
            .field("autores", reqvld::array(reqvld::object().field("nombre", reqvld::string())))
            .field("tags", reqvld::array(reqvld::string())),
    );
    let out = validate(
        &schema,
        json!({ "autores": [null, { "nombre": "Julio" }], "tags": ["a", null] }),
    );
    assert_eq!(
        out.result,
        Some(json!({ "autores": [{}, { "nombre": "Julio" }], "tags": ["a", null] }))
    );
}

#[test]
fn array_at_root_uses_empty_path() {
    let schema = bind(reqvld::array(reqvld::integer().not_null()));
    let out = validate(&schema, json!([1, null, "x"]));
    assert_eq!(out.paths(), vec!["", ""]);
}

#[test]
fn nested_arrays() {
    let schema = bind(reqvld::object().field(
        "capitulos",
        reqvld::array(reqvld::object().field(
            "paginas",
            reqvld::array(reqvld::object().field("numero", reqvld::integer().not_null())),
        )),
    ));
    let out = validate(
        &schema,
        json!({ "capitulos": [{ "paginas": [{ "numero": 1 }, {}] }, {}] }),
    );
    assert_eq!(out.paths(), vec!["capitulos.paginas.numero"]);
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

#[test]
fn binding_twice_gives_identical_outcomes() {
    let raw: RawSchema = libro()
        .field(
            "autores",
            reqvld::array(reqvld::object().field("nombre", reqvld::string().not_null())),
        )
        .into();
    let a = reqvld::bind(&raw).unwrap();
    let b = reqvld::bind(&raw).unwrap();

    for input in [json!({ "precio": -124 }), json!({ "titulo": "x", "precio": "3" }), json!(7)] {
        assert_eq!(validate(&a, input.clone()), validate(&b, input));
    }
}

#[test]
fn bound_schema_is_shared_across_threads() {
    let schema = bind(libro());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let schema = schema.clone();
            std::thread::spawn(move || {
                let out = validate(&schema, json!({ "titulo": format!("t{i}"), "precio": i }));
                out.is_valid()
            })
        })
        .collect();
    for h in handles {
        assert!(h.join().unwrap());
    }
}

#[test]
fn check_returns_sanitized_value_or_failure() {
    let schema = bind(libro());
    assert_eq!(
        schema.check_blocking(&json!({ "titulo": "Rayuela", "precio": 1, "x": 0 })).unwrap(),
        json!({ "titulo": "Rayuela", "precio": 1.0 })
    );

    let err = schema.check_blocking(&json!({})).unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.as_validation().unwrap().len(), 1);
}

#[test]
fn check_json_parses_text() {
    let schema = bind(libro());
    let v = futures::executor::block_on(schema.check_json(r#"{"titulo": "Rayuela"}"#)).unwrap();
    assert_eq!(v, json!({ "titulo": "Rayuela" }));

    let err = futures::executor::block_on(schema.check_json("{")).unwrap_err();
    assert_eq!(err.as_validation().unwrap().paths(), vec![""]);
}
