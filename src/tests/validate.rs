// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{scalar, ty, v};
use crate::number::BigInt;
use crate::schema::error::{text, value as frag};
use crate::schema::Schema;
use crate::{
    ArithOp, Fragment, MatchArm, Number, PatternType, Scalar, SelfExpr, Shape, ShapeEntry,
    ShapeKey, Ty, Type, ValidationError, Value,
};

use std::collections::BTreeMap;
use std::rc::Rc;

use num_traits::One;
use serde_json::json;

fn entry(key: &str, t: Ty) -> ShapeEntry {
    ShapeEntry {
        key: ShapeKey::Literal(key.into()),
        ty: t,
        optional: false,
    }
}

fn opt_entry(key: &str, t: Ty) -> ShapeEntry {
    ShapeEntry {
        key: ShapeKey::Literal(key.into()),
        ty: t,
        optional: true,
    }
}

fn pattern_entry(pattern: &str, t: Ty) -> ShapeEntry {
    ShapeEntry {
        key: ShapeKey::Pattern(PatternType::compile(pattern, "").expect("test pattern")),
        ty: t,
        optional: false,
    }
}

fn shape(entries: Vec<ShapeEntry>, rest: Option<Ty>) -> Ty {
    ty(Type::Shape(Shape { entries, rest }))
}

fn check(datum: &Value, t: Ty) -> Vec<ValidationError> {
    Schema::from_type(t).validate(datum).expect("validate")
}

fn err(path: &[&str], message: Vec<Fragment>) -> ValidationError {
    ValidationError::new(path.iter().map(|s| Rc::from(*s)).collect(), message)
}

#[test]
fn literal_number() {
    let datum = v(json!(10));
    assert_eq!(check(&datum, ty(Type::Literal(v(json!(10))))), vec![]);

    assert_eq!(
        check(&datum, ty(Type::Literal(v(json!(11))))),
        vec![err(&[], vec![frag(&datum), text("is not"), frag(&v(json!(11)))])]
    );
}

#[test]
fn literal_string() {
    let datum = v(json!("10"));
    assert_eq!(check(&datum, ty(Type::Literal(v(json!("10"))))), vec![]);

    assert_eq!(
        check(&datum, ty(Type::Literal(v(json!("11"))))),
        vec![err(&[], vec![frag(&datum), text("is not"), frag(&v(json!("11")))])]
    );
}

#[test]
fn literal_bool() {
    assert_eq!(check(&v(json!(true)), ty(Type::Literal(v(json!(true))))), vec![]);
    assert_eq!(
        check(&v(json!(true)), ty(Type::Literal(v(json!(false))))),
        vec![err(
            &[],
            vec![frag(&v(json!(true))), text("is not"), frag(&v(json!(false)))]
        )]
    );
}

#[test]
fn nil_requires_undefined() {
    assert_eq!(check(&Value::Undefined, ty(Type::Nil)), vec![]);
    assert_eq!(
        check(&v(json!("10")), ty(Type::Nil)),
        vec![err(&[], vec![frag(&v(json!("10"))), text("should be undefined")])]
    );
}

#[test]
fn sequence_of_strings() {
    let t = ty(Type::Sequence(Some(scalar(Scalar::Str))));
    assert_eq!(check(&v(json!(["10", "12"])), t), vec![]);

    let t = ty(Type::Sequence(Some(scalar(Scalar::Str))));
    assert_eq!(
        check(&v(json!(["10", 12])), t),
        vec![err(&["1"], vec![frag(&v(json!(12))), text("is not string")])]
    );
}

#[test]
fn empty_array_only() {
    assert_eq!(check(&v(json!([])), ty(Type::Sequence(None))), vec![]);
    assert_eq!(
        check(&v(json!([1])), ty(Type::Sequence(None))),
        vec![err(&[], vec![frag(&v(json!([1]))), text("is not an empty array")])]
    );
}

#[test]
fn enum_membership() {
    let values = vec![v(json!({"a": 0})), v(json!({"a": 1}))];
    assert_eq!(check(&v(json!({"a": 1})), ty(Type::Enum(values.clone()))), vec![]);

    let datum = v(json!({"a": 3}));
    assert_eq!(
        check(&datum, ty(Type::Enum(values.clone()))),
        vec![err(
            &[],
            vec![
                frag(&datum),
                text("is not one of enum"),
                frag(&Value::from(values)),
            ]
        )]
    );
}

#[test]
fn nested_object_paths() {
    let t = shape(
        vec![entry("a", shape(vec![entry("b", scalar(Scalar::Uint(32)))], None))],
        None,
    );
    assert_eq!(check(&v(json!({"a": {"b": 1}})), t), vec![]);

    let t = shape(
        vec![entry("a", shape(vec![entry("b", scalar(Scalar::Uint(32)))], None))],
        None,
    );
    assert_eq!(
        check(&v(json!({"a": {"b": "1"}})), t),
        vec![err(&["a", "b"], vec![frag(&v(json!("1"))), text("is not an integer")])]
    );
}

#[test]
fn never_always_errors() {
    let t = shape(
        vec![entry("a", shape(vec![entry("b", ty(Type::Never))], None))],
        None,
    );
    assert_eq!(
        check(&v(json!({"a": {}})), t),
        vec![err(&["a", "b"], vec![text("property should be void")])]
    );
}

#[test]
fn tuple_by_position() {
    let t = ty(Type::Tuple {
        elems: vec![
            shape(vec![entry("a", scalar(Scalar::Int(32)))], None),
            shape(vec![entry("b", scalar(Scalar::Uint(32)))], None),
        ],
        rest: None,
    });
    assert_eq!(check(&v(json!([{"a": 10}, {"b": 10}])), t), vec![]);

    let t = ty(Type::Tuple {
        elems: vec![
            shape(vec![entry("a", scalar(Scalar::Int(32)))], None),
            shape(vec![entry("b", scalar(Scalar::Uint(32)))], None),
        ],
        rest: None,
    });
    assert_eq!(
        check(&v(json!([{"a": 10}, {"b": -10}])), t),
        vec![err(
            &["b"],
            vec![
                frag(&v(json!("-10"))),
                text("is out of range of"),
                text("uint32"),
            ]
        )]
    );
}

#[test]
fn tuple_requires_array() {
    let t = ty(Type::Tuple {
        elems: vec![scalar(Scalar::Int(32))],
        rest: None,
    });
    let errors = check(&v(json!(1)), t);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, Vec::<Rc<str>>::new());
    assert_eq!(errors[0].message[0], frag(&v(json!(1))));
    assert_eq!(errors[0].message[1], text("is not tuple"));
}

#[test]
fn tuple_rest_slot() {
    let t = ty(Type::Tuple {
        elems: vec![scalar(Scalar::Str)],
        rest: Some(scalar(Scalar::Uint(32))),
    });
    assert_eq!(check(&v(json!(["id", 1, 2, 3])), t), vec![]);

    let t = ty(Type::Tuple {
        elems: vec![scalar(Scalar::Str)],
        rest: Some(scalar(Scalar::Uint(32))),
    });
    assert_eq!(
        check(&v(json!(["id", 1, "x"])), t),
        vec![err(&[], vec![frag(&v(json!("x"))), text("is not an integer")])]
    );
}

#[test]
fn intersection_accumulates() {
    let all = ty(Type::Intersection(vec![
        shape(vec![entry("b", scalar(Scalar::Str))], None),
        shape(vec![entry("c", scalar(Scalar::Int(32)))], None),
    ]));
    let t = shape(vec![entry("a", all)], None);
    assert_eq!(check(&v(json!({"a": {"b": "1", "c": 1}})), t), vec![]);

    let all = ty(Type::Intersection(vec![
        shape(vec![entry("b", scalar(Scalar::Str))], None),
        shape(vec![entry("c", scalar(Scalar::Int(32)))], None),
    ]));
    let t = shape(vec![entry("a", all)], None);
    assert_eq!(
        check(&v(json!({"a": {"b": "1", "c": "1"}})), t),
        vec![err(&["a", "c"], vec![frag(&v(json!("1"))), text("is not an integer")])]
    );
}

#[test]
fn union_collects_all_branches() {
    let any = ty(Type::Union(vec![
        shape(vec![entry("b", scalar(Scalar::Str))], None),
        shape(vec![entry("b", scalar(Scalar::Int(32)))], None),
    ]));
    let t = shape(vec![entry("a", any)], None);
    assert_eq!(check(&v(json!({"a": {"b": 1}})), t), vec![]);

    let any = ty(Type::Union(vec![
        shape(vec![entry("b", scalar(Scalar::Str))], None),
        shape(vec![entry("b", scalar(Scalar::Int(32)))], None),
    ]));
    let t = shape(vec![entry("a", any)], None);
    assert_eq!(
        check(&v(json!({"a": {"b": [1]}})), t),
        vec![
            err(&["a", "b"], vec![frag(&v(json!([1]))), text("is not string")]),
            err(&["a", "b"], vec![frag(&v(json!([1]))), text("is not an integer")]),
        ]
    );
}

#[test]
fn exactly_one() {
    let t = ty(Type::ExactlyOne(vec![
        shape(vec![entry("a", scalar(Scalar::Int(32)))], None),
        shape(vec![entry("b", scalar(Scalar::Int(32)))], None),
    ]));
    assert_eq!(check(&v(json!({"a": 1, "b": "1"})), t), vec![]);
}

#[test]
fn exactly_one_reports_match_count() {
    let t = ty(Type::ExactlyOne(vec![
        shape(vec![entry("a", scalar(Scalar::Int(32)))], None),
        shape(vec![entry("b", scalar(Scalar::Int(32)))], None),
    ]));
    let datum = v(json!({"a": 1, "b": 1}));
    let errors = check(&datum, t);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message[0], frag(&datum));
    assert_eq!(errors[0].message[1], text("should match one and only one of"));
    assert_eq!(errors[0].message[3], text("but matches"));
    assert_eq!(errors[0].message[4], frag(&Value::from(2u64)));
}

#[test]
fn exactly_one_in_sequence() {
    let one = ty(Type::ExactlyOne(vec![
        shape(vec![entry("a", scalar(Scalar::Int(32)))], None),
        shape(vec![entry("b", scalar(Scalar::Int(32)))], None),
        shape(vec![entry("c", scalar(Scalar::Int(32)))], None),
    ]));
    let t = ty(Type::Sequence(Some(one)));
    assert_eq!(check(&v(json!([{"a": 1}, {"b": 1}, {"c": 1}])), t), vec![]);
}

#[test]
fn negation() {
    let t = shape(vec![entry("a", ty(Type::Negation(scalar(Scalar::Str))))], None);
    assert_eq!(check(&v(json!({"a": 1})), t), vec![]);

    let t = shape(vec![entry("a", ty(Type::Negation(scalar(Scalar::Str))))], None);
    let errors = check(&v(json!({"a": "1"})), t);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, vec![Rc::from("a")]);
    assert_eq!(errors[0].message[0], frag(&v(json!("1"))));
    assert_eq!(errors[0].message[1], text("should not match type"));
}

#[test]
fn pattern_keys_route_by_regex() {
    let t = shape(
        vec![
            pattern_entry(r"\D+", scalar(Scalar::Int(32))),
            pattern_entry(r"\d+", scalar(Scalar::Str)),
        ],
        None,
    );
    assert_eq!(
        check(&v(json!({"a": 1, "b": 2, "1": "a", "2": "b"})), t),
        vec![]
    );

    let t = shape(
        vec![
            pattern_entry(r"\D+", scalar(Scalar::Int(32))),
            pattern_entry(r"\d+", scalar(Scalar::Str)),
        ],
        None,
    );
    assert_eq!(
        check(&v(json!({"a": 1, "b": 2, "1": 1, "2": "b"})), t),
        vec![err(&["1"], vec![frag(&v(json!(1))), text("is not string")])]
    );
}

#[test]
fn rest_catches_unmatched_keys() {
    let t = shape(
        vec![entry("a", scalar(Scalar::Int(32)))],
        Some(scalar(Scalar::Str)),
    );
    assert_eq!(check(&v(json!({"a": 1, "b": "1", "$rest": "2"})), t), vec![]);

    let t = shape(
        vec![pattern_entry(r"\d+", scalar(Scalar::Int(32)))],
        Some(scalar(Scalar::Str)),
    );
    assert_eq!(check(&v(json!({"1": 1, "b": "1", "$rest": "2"})), t), vec![]);

    let t = shape(
        vec![entry("a", scalar(Scalar::Int(32)))],
        Some(scalar(Scalar::Str)),
    );
    assert_eq!(
        check(&v(json!({"a": 1, "b": "1", "c": 2})), t),
        vec![err(&["c"], vec![frag(&v(json!(2))), text("is not string")])]
    );
}

#[test]
fn never_rest_closes_the_shape() {
    let mut m = BTreeMap::new();
    m.insert(Value::from("a"), Value::from(1i64));
    m.insert(Value::from("b"), Value::from("1"));
    m.insert(Value::from("c"), Value::Undefined);
    let datum = Value::from(m);

    let t = shape(vec![entry("a", scalar(Scalar::Int(32)))], Some(ty(Type::Never)));
    assert_eq!(
        check(&datum, t),
        vec![
            err(&["b"], vec![text("property should be void")]),
            err(&["c"], vec![text("property should be void")]),
        ]
    );
}

#[test]
fn open_shape_accepts_undeclared_keys() {
    let t = shape(vec![entry("a", scalar(Scalar::Int(32)))], None);
    assert_eq!(check(&v(json!({"a": 1, "z": true, "y": [1]})), t), vec![]);
}

#[test]
fn optional_entries_skip_missing_keys() {
    let t = shape(vec![opt_entry("b", scalar(Scalar::Str))], None);
    assert_eq!(check(&v(json!({})), t), vec![]);

    let t = shape(vec![opt_entry("b", scalar(Scalar::Str))], None);
    assert_eq!(
        check(&v(json!({"b": 5})), t),
        vec![err(&["b"], vec![frag(&v(json!(5))), text("is not string")])]
    );
}

#[test]
fn reference_to_sibling_type() {
    let t = shape(
        vec![
            entry("a", scalar(Scalar::Int(32))),
            entry("b", ty(Type::Reference(vec!["a".into()]))),
        ],
        None,
    );
    assert_eq!(check(&v(json!({"a": 1, "b": 2})), t), vec![]);
}

#[test]
fn reference_recursion_over_nested_data() {
    let t = shape(
        vec![
            entry("a", scalar(Scalar::Int(32))),
            entry(
                "b",
                ty(Type::Union(vec![
                    ty(Type::Reference(vec![])),
                    ty(Type::Literal(Value::Null)),
                ])),
            ),
        ],
        None,
    );
    assert_eq!(
        check(&v(json!({"a": 1, "b": {"a": 1, "b": {"a": 1, "b": null}}})), t),
        vec![]
    );
}

#[test]
fn reference_must_not_reference_itself() {
    let t = shape(vec![entry("a", ty(Type::Reference(vec!["a".into()])))], None);
    let error = Schema::from_type(t).validate(&v(json!({}))).unwrap_err();
    assert_eq!(error.to_string(), "ref must not ref itself");
}

#[test]
fn computed_field_equals_expression() {
    let expr = SelfExpr::Arith {
        op: ArithOp::Mul,
        lhs: Box::new(SelfExpr::Member {
            object: Box::new(SelfExpr::Root),
            path: vec!["a".into()],
        }),
        rhs: Box::new(SelfExpr::Const(Value::from(8i64))),
    };
    let t = shape(
        vec![
            entry("a", scalar(Scalar::Int(32))),
            entry("b", ty(Type::Computed(Rc::new(expr)))),
        ],
        None,
    );
    assert_eq!(check(&v(json!({"a": 2, "b": 16})), t), vec![]);
}

#[test]
fn computed_field_mismatch_renders_expression() {
    let expr = SelfExpr::Arith {
        op: ArithOp::Mul,
        lhs: Box::new(SelfExpr::Member {
            object: Box::new(SelfExpr::Root),
            path: vec!["a".into()],
        }),
        rhs: Box::new(SelfExpr::Const(Value::from(2i64))),
    };
    let t = shape(
        vec![
            entry("a", scalar(Scalar::Int(32))),
            entry("b", ty(Type::Computed(Rc::new(expr)))),
        ],
        None,
    );
    assert_eq!(
        check(&v(json!({"a": 2, "b": 16})), t),
        vec![err(
            &["b"],
            vec![
                frag(&v(json!(16))),
                text("should equal"),
                frag(&v(json!(4))),
                text("which generated by expression"),
                text("(self.a * 2)"),
            ]
        )]
    );
}

#[test]
fn match_selects_first_accepting_guard() {
    let scrutinee = Rc::new(SelfExpr::Member {
        object: Box::new(SelfExpr::Root),
        path: vec!["a".into()],
    });
    let t = shape(
        vec![
            entry("a", scalar(Scalar::Int(32))),
            entry(
                "b",
                ty(Type::Match {
                    scrutinee: scrutinee.clone(),
                    cases: vec![
                        MatchArm {
                            guard: scalar(Scalar::Str),
                            result: scalar(Scalar::Int(32)),
                        },
                        MatchArm {
                            guard: scalar(Scalar::Int(32)),
                            result: scalar(Scalar::Str),
                        },
                    ],
                }),
            ),
        ],
        None,
    );
    assert_eq!(check(&v(json!({"a": 1, "b": "ok"})), t), vec![]);
}

#[test]
fn match_case_result_mismatch() {
    let scrutinee = Rc::new(SelfExpr::Member {
        object: Box::new(SelfExpr::Root),
        path: vec!["a".into()],
    });
    let t = shape(
        vec![
            entry("a", scalar(Scalar::Int(32))),
            entry(
                "b",
                ty(Type::Match {
                    scrutinee,
                    cases: vec![
                        MatchArm {
                            guard: scalar(Scalar::Str),
                            result: scalar(Scalar::Int(32)),
                        },
                        MatchArm {
                            guard: scalar(Scalar::Int(32)),
                            result: ty(Type::Literal(v(json!("sss")))),
                        },
                    ],
                }),
            ),
        ],
        None,
    );
    assert_eq!(
        check(&v(json!({"a": 1, "b": "ok"})), t),
        vec![err(
            &["b"],
            vec![frag(&v(json!("ok"))), text("is not"), frag(&v(json!("sss")))]
        )]
    );
}

#[test]
fn match_without_accepting_guard() {
    let scrutinee = Rc::new(SelfExpr::Member {
        object: Box::new(SelfExpr::Root),
        path: vec!["a".into()],
    });
    let t = shape(
        vec![
            entry("a", ty(Type::Literal(Value::Null))),
            entry(
                "b",
                ty(Type::Match {
                    scrutinee,
                    cases: vec![MatchArm {
                        guard: scalar(Scalar::Str),
                        result: scalar(Scalar::Int(32)),
                    }],
                }),
            ),
        ],
        None,
    );
    let errors = check(&v(json!({"a": null, "b": 1})), t);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message[1], text("doesn't match any case of"));
}

#[test]
fn range_bounds_value_and_length() {
    let t = shape(
        vec![entry(
            "a",
            ty(Type::Range {
                min: Number::from(0i64),
                max: Number::from(10i64),
                inner: scalar(Scalar::Int(32)),
            }),
        )],
        None,
    );
    assert_eq!(check(&v(json!({"a": 10})), t), vec![]);

    let t = shape(
        vec![entry(
            "a",
            ty(Type::Range {
                min: Number::from(10i64),
                max: Number::from(20i64),
                inner: scalar(Scalar::Int(32)),
            }),
        )],
        None,
    );
    assert_eq!(
        check(&v(json!({"a": 101})), t),
        vec![err(&["a"], vec![frag(&v(json!(101))), text("is not in range(10, 20)")])]
    );

    let t = ty(Type::Range {
        min: Number::from(1i64),
        max: Number::from(3i64),
        inner: scalar(Scalar::Str),
    });
    assert_eq!(check(&v(json!("ab")), t), vec![]);

    let t = ty(Type::Range {
        min: Number::from(1i64),
        max: Number::from(3i64),
        inner: scalar(Scalar::Str),
    });
    assert_eq!(
        check(&v(json!(true)), t),
        vec![err(&[], vec![frag(&v(json!(true))), text("is not in number, array, string")])]
    );
}

#[test]
fn int8_boundaries() {
    assert_eq!(check(&v(json!(-128)), scalar(Scalar::Int(8))), vec![]);
    assert_eq!(check(&v(json!(127)), scalar(Scalar::Int(8))), vec![]);

    assert_eq!(
        check(&v(json!(-129)), scalar(Scalar::Int(8))),
        vec![err(
            &[],
            vec![
                frag(&v(json!("-129"))),
                text("is out of range of"),
                text("int8"),
            ]
        )]
    );
    assert_eq!(
        check(&v(json!(128)), scalar(Scalar::Int(8))),
        vec![err(
            &[],
            vec![frag(&v(json!("128"))), text("is out of range of"), text("int8")]
        )]
    );
}

#[test]
fn uint32_rejects_negative() {
    assert_eq!(
        check(&v(json!(-10)), scalar(Scalar::Uint(32))),
        vec![err(
            &[],
            vec![
                frag(&v(json!("-10"))),
                text("is out of range of"),
                text("uint32"),
            ]
        )]
    );
    assert_eq!(
        check(&v(json!("1")), scalar(Scalar::Uint(32))),
        vec![err(&[], vec![frag(&v(json!("1"))), text("is not an integer")])]
    );
}

#[test]
fn int128_boundaries_via_bigint() {
    // i128::MAX == 2^127 - 1, in bounds; 2^127 is one past.
    let max = Value::Number(Number::from(i128::MAX));
    assert_eq!(check(&max, scalar(Scalar::Int(128))), vec![]);

    let over = Value::Number(Number::from(BigInt::one() << 127u32));
    let errors = check(&over, scalar(Scalar::Int(128)));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message[1], text("is out of range of"));
    assert_eq!(errors[0].message[2], text("int128"));
}

#[test]
fn float_and_double() {
    assert_eq!(check(&v(json!(1.5)), scalar(Scalar::Double)), vec![]);
    assert_eq!(check(&v(json!(3)), scalar(Scalar::Float)), vec![]);
    assert_eq!(
        check(&v(json!("x")), scalar(Scalar::Double)),
        vec![err(&[], vec![frag(&v(json!("x"))), text("is not double")])]
    );
}

#[test]
fn definition_missing_is_data_level() {
    let t = shape(vec![entry("x", ty(Type::Definition(vec!["Nope".into()])))], None);
    assert_eq!(
        check(&v(json!({"x": 1})), t),
        vec![err(&["x"], vec![text("not implemented type: Nope")])]
    );
}

#[test]
fn definition_resolves_at_walk_time() {
    let person = shape(vec![entry("name", scalar(Scalar::Str))], None);
    let mut declarations = BTreeMap::new();
    declarations.insert(Rc::from("Person"), person);
    let schema = Schema::new(ty(Type::Definition(vec!["Person".into()])), declarations);

    assert_eq!(schema.validate(&v(json!({"name": "ada"}))).unwrap(), vec![]);
    let errors = schema.validate(&v(json!({"name": 1}))).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, vec![Rc::from("name")]);
}

#[test]
fn pattern_type_matches_strings_and_numbers() {
    let t = ty(Type::Pattern(PatternType::compile(r"\d{3,}", "").unwrap()));
    assert_eq!(check(&v(json!("100")), t), vec![]);

    let t = ty(Type::Pattern(PatternType::compile(r"\d{3,}", "").unwrap()));
    assert_eq!(check(&v(json!(1234)), t), vec![]);

    let t = ty(Type::Pattern(PatternType::compile(r"\d{3,}", "").unwrap()));
    let errors = check(&v(json!("10")), t);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message[1], text("doesn't match regex"));
}

#[test]
fn description_is_transparent() {
    let t = ty(Type::Description {
        text: "a counter".into(),
        inner: scalar(Scalar::Uint(32)),
    });
    assert_eq!(check(&v(json!(5)), t), vec![]);
}

#[test]
fn mock_override_validates_inner() {
    let t = ty(Type::MockOverride {
        alts: vec![v(json!(1))],
        inner: scalar(Scalar::Uint(32)),
    });
    assert_eq!(check(&v(json!(7)), t), vec![]);

    let t = ty(Type::MockOverride {
        alts: vec![v(json!(1))],
        inner: scalar(Scalar::Uint(32)),
    });
    assert_eq!(
        check(&v(json!("7")), t),
        vec![err(&[], vec![frag(&v(json!("7"))), text("is not an integer")])]
    );
}
