// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{scalar, ty, v};
use crate::schema::Schema;
use crate::{
    lower, Expr, PatternType, Program, PropKey, Property, Scalar, Shape, ShapeEntry, ShapeKey, Ty,
    Type, Value,
};

use std::rc::Rc;

use serde_json::json;

fn entry(key: &str, t: Ty) -> ShapeEntry {
    ShapeEntry {
        key: ShapeKey::Literal(key.into()),
        ty: t,
        optional: false,
    }
}

fn shape(entries: Vec<ShapeEntry>, rest: Option<Ty>) -> Ty {
    ty(Type::Shape(Shape { entries, rest }))
}

/// Every mock call self-checks through the validator, so `Ok` means the
/// output conforms to the schema it was generated from.
fn mocked(t: Ty) -> Value {
    Schema::from_type(t).mock().expect("mock")
}

#[test]
fn basic_shape() {
    let t = shape(
        vec![
            entry("a", ty(Type::Literal(v(json!(1))))),
            entry("b", ty(Type::Literal(Value::Null))),
            entry("c", scalar(Scalar::Int(32))),
            entry("d", scalar(Scalar::Str)),
            entry(
                "e",
                ty(Type::Union(vec![
                    shape(vec![entry("a", scalar(Scalar::Str))], None),
                    shape(vec![entry("b", scalar(Scalar::Uint(32)))], None),
                ])),
            ),
        ],
        None,
    );
    let out = mocked(t);
    assert_eq!(out["a"], v(json!(1)));
    assert_eq!(out["b"], Value::Null);
    assert!(matches!(out["c"], Value::Number(_)));
    assert!(matches!(out["d"], Value::String(_)));
}

#[test]
fn reference_pattern_and_mock_key() {
    let t = shape(
        vec![
            entry(
                "d",
                ty(Type::Description {
                    text: "test".into(),
                    inner: scalar(Scalar::Str),
                }),
            ),
            entry("f", ty(Type::Reference(vec!["d".into()]))),
            entry(
                "g",
                ty(Type::Pattern(PatternType::compile(r"\d+", "").unwrap())),
            ),
        ],
        Some(ty(Type::MockKey {
            keys: vec!["k1".into(), "k2".into()],
            inner: scalar(Scalar::Uint(32)),
        })),
    );
    let out = mocked(t);
    assert!(matches!(out["d"], Value::String(_)));
    assert!(matches!(out["f"], Value::String(_)));

    let g = out["g"].as_string().unwrap();
    assert!(regex::Regex::new(r"\d+").unwrap().is_match(g));

    let rest_present = !out["k1"].is_undefined() || !out["k2"].is_undefined();
    assert!(rest_present, "rest entry should mock one of its key hints");
}

#[test]
fn mock_override_covers_intersection() {
    let t = shape(
        vec![entry(
            "f",
            ty(Type::MockOverride {
                alts: vec![v(json!({"a": 1, "b": "2"}))],
                inner: ty(Type::Intersection(vec![
                    shape(vec![entry("a", scalar(Scalar::Int(32)))], None),
                    shape(vec![entry("b", scalar(Scalar::Str))], None),
                ])),
            }),
        )],
        None,
    );
    let out = mocked(t);
    assert_eq!(out["f"], v(json!({"a": 1, "b": "2"})));
}

#[test]
fn intersection_without_override_is_fatal() {
    let t = ty(Type::Intersection(vec![
        shape(vec![entry("b", scalar(Scalar::Str))], None),
        shape(vec![entry("c", scalar(Scalar::Int(32)))], None),
    ]));
    let error = Schema::from_type(t).mock().unwrap_err();
    assert!(error.to_string().starts_with(r#""allOf" must be used with "mock" type"#));
}

#[test]
fn negation_and_one_of_have_no_mock() {
    let t = ty(Type::Negation(scalar(Scalar::Str)));
    assert!(Schema::from_type(t).mock().is_err());

    let t = ty(Type::ExactlyOne(vec![scalar(Scalar::Str)]));
    assert!(Schema::from_type(t).mock().is_err());
}

#[test]
fn computed_fields_read_generated_siblings() {
    let expr = crate::SelfExpr::Arith {
        op: crate::ArithOp::Mul,
        lhs: Box::new(crate::SelfExpr::Member {
            object: Box::new(crate::SelfExpr::Root),
            path: vec!["a".into()],
        }),
        rhs: Box::new(crate::SelfExpr::Const(Value::from(8i64))),
    };
    let t = shape(
        vec![
            entry("a", ty(Type::Literal(v(json!(2))))),
            entry("b", ty(Type::Computed(Rc::new(expr)))),
        ],
        None,
    );
    let out = mocked(t);
    assert_eq!(out["b"], v(json!(16)));
}

#[test]
fn enum_mocks_a_member() {
    let values = vec![v(json!(0)), v(json!(10)), v(json!(11))];
    let out = mocked(ty(Type::Enum(values.clone())));
    assert!(values.contains(&out));
}

#[test]
fn sequence_mocks_bounded_length() {
    let out = mocked(ty(Type::Sequence(Some(scalar(Scalar::Uint(8))))));
    let arr = out.as_array().unwrap();
    assert!((1..=10).contains(&arr.len()));
}

#[test]
fn empty_sequence_mocks_empty() {
    let out = mocked(ty(Type::Sequence(None)));
    assert_eq!(out, Value::new_array());
}

#[test]
fn tuple_mocks_by_position() {
    let t = ty(Type::Tuple {
        elems: vec![scalar(Scalar::Str), scalar(Scalar::Uint(8))],
        rest: None,
    });
    let out = mocked(t);
    let arr = out.as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert!(matches!(arr[0], Value::String(_)));
    assert!(matches!(arr[1], Value::Number(_)));
}

#[test]
fn nil_entries_are_omitted() {
    let t = shape(
        vec![
            entry("a", ty(Type::Literal(v(json!(1))))),
            entry("b", ty(Type::Nil)),
        ],
        None,
    );
    let out = mocked(t);
    assert!(out["b"].is_undefined());
    assert_eq!(out.as_object().unwrap().len(), 1);
}

#[test]
fn recursive_optional_type_terminates() {
    // type A { a?: A } — generation must bottom out within the expansion
    // budget and still validate.
    let program = Program::new(Expr::ident("A")).declare(
        &["A"],
        Expr::object(vec![
            Property::new(PropKey::ident("a"), Expr::ident("A")).optional()
        ]),
    );
    let schema = lower(&program).unwrap();
    let out = schema.mock().expect("recursive mock terminates");
    assert_eq!(schema.validate(&out).unwrap(), vec![]);
}

#[test]
fn recursive_union_bottoms_out_on_terminal_member() {
    let t = shape(
        vec![entry(
            "b",
            ty(Type::Union(vec![
                ty(Type::Reference(vec![])),
                ty(Type::Literal(Value::Null)),
            ])),
        )],
        None,
    );
    let schema = Schema::from_type(t);
    let out = schema.mock().expect("union recursion terminates");
    assert_eq!(schema.validate(&out).unwrap(), vec![]);
}

#[test]
fn union_of_only_recursive_members_exceeds_budget() {
    let t = shape(
        vec![entry("b", ty(Type::Union(vec![ty(Type::Reference(vec![]))])))],
        None,
    );
    let error = Schema::from_type(t).mock().unwrap_err();
    assert!(error.to_string().contains("expansion budget"));
}

#[test]
fn required_cycle_fails_instead_of_looping() {
    let program = Program::new(Expr::ident("B")).declare(
        &["B"],
        Expr::object(vec![Property::new(PropKey::ident("b"), Expr::ident("B"))]),
    );
    let schema = lower(&program).unwrap();
    assert!(schema.mock().is_err());
}

#[test]
fn rest_without_mock_key_is_fatal() {
    let t = shape(vec![], Some(scalar(Scalar::Str)));
    let error = Schema::from_type(t).mock().unwrap_err();
    assert!(error.to_string().contains("mockKey"));
}

#[test]
fn pattern_key_uses_hints() {
    let t = shape(
        vec![ShapeEntry {
            key: ShapeKey::Pattern(PatternType::compile(r"^k\d$", "").unwrap()),
            ty: ty(Type::MockKey {
                keys: vec!["k1".into()],
                inner: scalar(Scalar::Uint(32)),
            }),
            optional: false,
        }],
        None,
    );
    let out = mocked(t);
    assert!(matches!(out["k1"], Value::Number(_)));
}

#[test]
fn scalar_mocks_stay_in_range() {
    for _ in 0..16 {
        let out = mocked(scalar(Scalar::Int(8)));
        let n = out.as_number().unwrap().as_i64().unwrap();
        assert!((-128..=127).contains(&n));

        let out = mocked(scalar(Scalar::Uint(8)));
        let n = out.as_number().unwrap().as_i64().unwrap();
        assert!((0..=255).contains(&n));
    }
}

#[test]
fn pattern_sampler_output_matches() {
    for pattern in [r"[a-z]{3,5}", r"\d+", r"(ab|cd)+x?", r"k\d"] {
        let t = ty(Type::Pattern(PatternType::compile(pattern, "").unwrap()));
        let out = mocked(t);
        let s = out.as_string().unwrap();
        assert!(
            regex::Regex::new(pattern).unwrap().is_match(s),
            "/{pattern}/ should accept {s:?}"
        );
    }
}

#[test]
fn mock_with_budget_controls_depth() {
    let program = Program::new(Expr::ident("A")).declare(
        &["A"],
        Expr::object(vec![
            Property::new(PropKey::ident("a"), Expr::ident("A")).optional()
        ]),
    );
    let schema = lower(&program).unwrap();
    let out = schema.mock_with_budget(1).expect("budget 1 still terminates");
    assert_eq!(schema.validate(&out).unwrap(), vec![]);

    // Depth is bounded by the budget: at most budget+1 nested objects
    // before forced reuse.
    let mut depth = 0;
    let mut cur = &out;
    while let Value::Object(_) = cur {
        let next = &cur["a"];
        if next.is_undefined() {
            break;
        }
        depth += 1;
        cur = next;
        assert!(depth <= 4, "generation must bottom out quickly");
    }
}

#[test]
fn compiled_schema_round_trip() {
    let program = Program::new(Expr::object(vec![
        Property::new(PropKey::ident("id"), Expr::ident("uint32")),
        Property::new(PropKey::ident("name"), Expr::ident("str")),
        Property::new(PropKey::ident("score"), Expr::ident("int8")).optional(),
        Property::new(
            PropKey::ident("tags"),
            Expr::ArrayOf(Some(Box::new(Expr::ident("str")))),
        ),
    ]));
    let schema = lower(&program).unwrap();
    let out = schema.mock().expect("mock");
    assert_eq!(schema.validate(&out).unwrap(), vec![]);
}
