//! Unions, pass-through fields and narrowed maps.

use std::sync::Arc;

use weft_cast::{CastOptions, cast};
use weft_core::{
    Error, FieldDefinition, InMemoryRegistry, StructDefinition, TypeReference, TypeRegistry,
    UnionDefinition, UnionMatchRule, Value, ValueTree,
};

fn registry() -> Arc<dyn TypeRegistry> {
    let mut exact = UnionDefinition::new(
        "demo.Exact",
        vec![TypeReference::atomic("Int64"), TypeReference::atomic("String")],
    );
    exact.match_rule = UnionMatchRule::ExactName;

    let registry = InMemoryRegistry::new()
        .with(UnionDefinition::new(
            "demo.Scalar",
            vec![TypeReference::atomic("Int32"), TypeReference::atomic("String")],
        ))
        .and_then(|r| r.with(exact))
        .and_then(|r| {
            r.with(UnionDefinition::new(
                "demo.IntOrTags",
                vec![
                    TypeReference::atomic("Int32"),
                    TypeReference::list(TypeReference::atomic("String")),
                ],
            ))
        })
        .and_then(|r| {
            r.with(UnionDefinition::new(
                "demo.PathPart",
                vec![TypeReference::atomic("String")],
            ))
        })
        .and_then(|r| {
            r.with(
                StructDefinition::new(
                    "demo.Identifier",
                    vec![FieldDefinition::new("name", TypeReference::atomic("String"))],
                )
                .with_constructor_type("demo.Slug"),
            )
        })
        .and_then(|r| {
            r.with(StructDefinition::new(
                "demo.Slug",
                vec![FieldDefinition::new("text", TypeReference::atomic("String"))],
            ))
        })
        .and_then(|r| {
            r.with(StructDefinition::new(
                "demo.Envelope",
                vec![
                    FieldDefinition::new("kind", TypeReference::atomic("String")),
                    FieldDefinition::new("payload", TypeReference::atomic("Int32")),
                ],
            ))
        })
        .unwrap();
    Arc::new(registry)
}

#[test]
fn test_union_picks_first_assignable_member() {
    weft_testhelpers::setup();

    let target = TypeReference::atomic("demo.Scalar");
    let out = cast(registry(), target.clone(), &ValueTree::from(4), CastOptions::new()).unwrap();
    assert_eq!(out, ValueTree::from(Value::Int32(4)));

    let out = cast(registry(), target.clone(), &ValueTree::from("x"), CastOptions::new()).unwrap();
    assert_eq!(out, ValueTree::from("x"));

    let err = cast(registry(), target, &ValueTree::from(true), CastOptions::new()).unwrap_err();
    insta::assert_snapshot!(err, @"type mismatch at <root>: expected demo.Scalar, got Boolean true");
}

#[test]
fn test_union_resolves_lists_to_its_list_member() {
    weft_testhelpers::setup();

    let target = TypeReference::atomic("demo.IntOrTags");
    let tags = ValueTree::list(["a", "b"]);
    let out = cast(registry(), target.clone(), &tags, CastOptions::new()).unwrap();
    assert_eq!(out, tags);

    let out = cast(registry(), target.clone(), &ValueTree::from(4), CastOptions::new()).unwrap();
    assert_eq!(out, ValueTree::from(Value::Int32(4)));

    let nested = ValueTree::list([ValueTree::list(["a"])]);
    let err = cast(registry(), target, &nested, CastOptions::new()).unwrap_err();
    insta::assert_snapshot!(err, @"type mismatch at [0]: expected String, got list");

    let err = cast(
        registry(),
        TypeReference::atomic("demo.Scalar"),
        &ValueTree::list(["a"]),
        CastOptions::new(),
    )
    .unwrap_err();
    insta::assert_snapshot!(err, @"type mismatch at <root>: expected demo.Scalar, got list");
}

#[test]
fn test_exact_name_union() {
    weft_testhelpers::setup();

    let target = TypeReference::atomic("demo.Exact");
    let out = cast(registry(), target.clone(), &ValueTree::from(3i64), CastOptions::new()).unwrap();
    assert_eq!(out, ValueTree::from(3i64));

    let err = cast(registry(), target, &ValueTree::from(3), CastOptions::new()).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }), "{err}");
}

#[test]
fn test_union_matcher_override() {
    weft_testhelpers::setup();

    let options = CastOptions::new()
        .union_matcher("demo.Scalar", |_, _, _| Some(TypeReference::atomic("String")));
    let out = cast(
        registry(),
        TypeReference::atomic("demo.Scalar"),
        &ValueTree::from(true),
        options,
    )
    .unwrap();
    assert_eq!(out, ValueTree::from("true"));
}

#[test]
fn test_identifier_path_part() {
    weft_testhelpers::setup();

    let options = || CastOptions::new().identifier_path_part("demo.PathPart", "demo.Identifier");
    let target = TypeReference::atomic("demo.PathPart");

    let out = cast(registry(), target.clone(), &ValueTree::from(7), options()).unwrap();
    assert_eq!(out, ValueTree::from(7u64));

    let slug = ValueTree::structure("demo.Slug", [("text", "a-b")]);
    let out = cast(registry(), target.clone(), &slug, options()).unwrap();
    assert_eq!(out, slug);

    let err = cast(registry(), target, &ValueTree::from(1.5), options()).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }), "{err}");
}

#[test]
fn test_pass_through_field_is_forwarded_verbatim() {
    weft_testhelpers::setup();

    let input = ValueTree::map([
        ("kind", ValueTree::from("raw")),
        (
            "payload",
            ValueTree::map([
                ("anything", ValueTree::list(["goes", "here"])),
                ("even", ValueTree::null()),
            ]),
        ),
    ]);
    let options = CastOptions::new().pass_through("demo.Envelope", "payload");
    let out = cast(registry(), TypeReference::atomic("demo.Envelope"), &input, options).unwrap();

    assert_eq!(out.get("payload"), input.get("payload"));
    assert!(matches!(out, ValueTree::Struct { ref type_name, .. } if type_name == "demo.Envelope"));
}

#[test]
fn test_without_pass_through_the_field_is_cast() {
    weft_testhelpers::setup();

    let input = ValueTree::map([
        ("kind", ValueTree::from("raw")),
        ("payload", ValueTree::from("not a number")),
    ]);
    let err = cast(
        registry(),
        TypeReference::atomic("demo.Envelope"),
        &input,
        CastOptions::new(),
    )
    .unwrap_err();
    insta::assert_snapshot!(err, @r#"type mismatch at payload: expected Int32, got String "not a number""#);
}

#[test]
fn test_field_set_factory_narrows_open_maps() {
    weft_testhelpers::setup();

    let options = CastOptions::new().field_set_factory(|depth, _path| {
        (depth == 0).then(|| vec![FieldDefinition::new("count", TypeReference::atomic("Uint32"))])
    });
    let input = ValueTree::map([
        ("count", ValueTree::from("5")),
        ("nested", ValueTree::map([("count", ValueTree::from("5"))])),
    ]);
    let out = cast(registry(), TypeReference::atomic("SymbolMap"), &input, options.clone()).unwrap();
    assert_eq!(
        out,
        ValueTree::map([
            ("count", ValueTree::from(Value::Uint32(5))),
            ("nested", ValueTree::map([("count", ValueTree::from("5"))])),
        ])
    );

    let missing = ValueTree::map([("other", ValueTree::from(1))]);
    let err = cast(registry(), TypeReference::atomic("SymbolMap"), &missing, options).unwrap_err();
    insta::assert_snapshot!(err, @"missing required fields at <root>: count");
}
