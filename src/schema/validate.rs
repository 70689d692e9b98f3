// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::schema::context::{child_path, Root};
use crate::schema::error::{text, value, Fragment, ValidationError};
use crate::schema::{Scalar, Schema, Shape, ShapeKey, Ty, Type};
use crate::value::Value;

use std::collections::BTreeSet;
use std::rc::Rc;

use anyhow::{bail, Result};
use log::debug;

/// Walks a value against a compiled schema, accumulating every data-level
/// defect found. Only schema-malformed conditions abort the walk.
pub struct Validator;

impl Validator {
    /// Validates `value` against `schema`.
    ///
    /// Returns the full list of `{path, message}` records produced by the
    /// walk; an empty list means the value conforms. `Err` is reserved for
    /// schema-malformed conditions (self-referencing `ref`, unresolvable
    /// ref path), never for plain data mismatches.
    pub fn validate(value: &Value, schema: &Schema) -> Result<Vec<ValidationError>> {
        debug!("validate: root type {}", schema.root());
        let mut root = Root::for_validate(value, schema);
        Self::walk(value, schema.root(), &[], &mut root)?;
        Ok(root.errors)
    }

    fn walk(datum: &Value, ty: &Ty, path: &[Rc<str>], root: &mut Root) -> Result<()> {
        match ty.as_type() {
            Type::Literal(expected) => {
                if datum != expected {
                    root.error(path, vec![value(datum), text("is not"), value(expected)]);
                }
                Ok(())
            }

            Type::Pattern(pattern) => {
                let matched = match datum {
                    Value::String(s) => pattern.is_match(s),
                    Value::Number(n) => pattern.is_match(&n.format_decimal()),
                    _ => false,
                };
                if !matched {
                    root.error(
                        path,
                        vec![
                            value(datum),
                            text("doesn't match regex"),
                            text(&pattern.to_string()),
                        ],
                    );
                }
                Ok(())
            }

            Type::Scalar(scalar) => {
                Self::validate_scalar(datum, *scalar, path, root);
                Ok(())
            }

            Type::Union(members) => {
                let mut collected = vec![];
                for member in members {
                    let branch = root.speculate(|r| Self::walk(datum, member, path, r))?;
                    if branch.is_empty() {
                        return Ok(());
                    }
                    collected.extend(branch);
                }
                root.errors.extend(collected);
                Ok(())
            }

            Type::Intersection(members) => {
                for member in members {
                    Self::walk(datum, member, path, root)?;
                }
                Ok(())
            }

            Type::ExactlyOne(members) => {
                let mut count: u64 = 0;
                for member in members {
                    let branch = root.speculate(|r| Self::walk(datum, member, path, r))?;
                    if branch.is_empty() {
                        count += 1;
                    }
                }
                if count != 1 {
                    root.error(
                        path,
                        vec![
                            value(datum),
                            text("should match one and only one of"),
                            text(&ty.to_string()),
                            text("but matches"),
                            value(&Value::from(count)),
                        ],
                    );
                }
                Ok(())
            }

            Type::Negation(inner) => {
                let branch = root.speculate(|r| Self::walk(datum, inner, path, r))?;
                if branch.is_empty() {
                    root.error(
                        path,
                        vec![
                            value(datum),
                            text("should not match type"),
                            text(&inner.to_string()),
                        ],
                    );
                }
                Ok(())
            }

            Type::Optional(inner) => {
                if datum.is_undefined() {
                    Ok(())
                } else {
                    Self::walk(datum, inner, path, root)
                }
            }

            Type::Enum(values) => {
                if !values.iter().any(|v| v == datum) {
                    root.error(
                        path,
                        vec![
                            value(datum),
                            text("is not one of enum"),
                            value(&Value::from(values.clone())),
                        ],
                    );
                }
                Ok(())
            }

            Type::Sequence(inner) => Self::validate_sequence(datum, ty, inner.as_ref(), path, root),

            Type::Tuple { elems, rest } => {
                Self::validate_tuple(datum, ty, elems, rest.as_ref(), path, root)
            }

            Type::Shape(shape) => Self::validate_shape(datum, ty, shape, path, root),

            Type::Reference(ref_path) => {
                let resolved = resolve_reference(ty, ref_path, root)?;
                Self::walk(datum, &resolved, path, root)
            }

            Type::Computed(expr) => {
                let data = root.data.clone();
                let expected = expr.eval(&data)?;
                if *datum != expected {
                    root.error(
                        path,
                        vec![
                            value(datum),
                            text("should equal"),
                            value(&expected),
                            text("which generated by expression"),
                            text(&expr.to_string()),
                        ],
                    );
                }
                Ok(())
            }

            Type::Definition(name_path) => {
                let name: Rc<str> = name_path.join(".").into();
                match root.declarations.get(&name).cloned() {
                    Some(declared) => Self::walk(datum, &declared, path, root),
                    None => {
                        root.error(
                            path,
                            vec![Fragment::Text(format!("not implemented type: {name}").into())],
                        );
                        Ok(())
                    }
                }
            }

            Type::Match { scrutinee, cases } => {
                let data = root.data.clone();
                let scrutinee_val = scrutinee.eval(&data)?;
                for arm in cases {
                    let branch =
                        root.speculate(|r| Self::walk(&scrutinee_val, &arm.guard, path, r))?;
                    if branch.is_empty() {
                        return Self::walk(datum, &arm.result, path, root);
                    }
                }
                root.error(
                    path,
                    vec![
                        value(datum),
                        text("doesn't match any case of"),
                        text(&ty.to_string()),
                    ],
                );
                Ok(())
            }

            Type::Range { min, max, inner } => {
                let measured = match datum {
                    Value::Number(n) => n.clone(),
                    Value::String(s) => crate::number::Number::from(s.chars().count()),
                    Value::Array(a) => crate::number::Number::from(a.len()),
                    _ => {
                        root.error(path, vec![value(datum), text("is not in number, array, string")]);
                        return Ok(());
                    }
                };
                if measured < *min || measured > *max {
                    root.error(
                        path,
                        vec![
                            value(datum),
                            Fragment::Text(
                                format!(
                                    "is not in range({}, {})",
                                    min.format_decimal(),
                                    max.format_decimal()
                                )
                                .into(),
                            ),
                        ],
                    );
                    return Ok(());
                }
                Self::walk(datum, inner, path, root)
            }

            Type::Description { inner, .. }
            | Type::MockOverride { inner, .. }
            | Type::MockKey { inner, .. } => Self::walk(datum, inner, path, root),

            Type::Nil => {
                if !datum.is_undefined() {
                    root.error(path, vec![value(datum), text("should be undefined")]);
                }
                Ok(())
            }

            Type::Absent => {
                if !datum.is_undefined() {
                    root.error(path, vec![value(datum), text("should be absent")]);
                }
                Ok(())
            }

            Type::Never => {
                root.error(path, vec![text("property should be void")]);
                Ok(())
            }
        }
    }

    fn validate_scalar(datum: &Value, scalar: Scalar, path: &[Rc<str>], root: &mut Root) {
        match scalar {
            Scalar::Any => {}
            Scalar::Bool => {
                if !matches!(datum, Value::Bool(_)) {
                    root.error(path, vec![value(datum), text("is not boolean")]);
                }
            }
            Scalar::Str => {
                if !matches!(datum, Value::String(_)) {
                    root.error(path, vec![value(datum), text("is not string")]);
                }
            }
            Scalar::Float | Scalar::Double => {
                let ok = matches!(datum, Value::Number(n) if crate::schema::is_float_value(n));
                if !ok {
                    let name = if scalar == Scalar::Float {
                        "is not float"
                    } else {
                        "is not double"
                    };
                    root.error(path, vec![value(datum), text(name)]);
                }
            }
            Scalar::Int(_) | Scalar::Uint(_) => {
                let n = match datum {
                    Value::Number(n) if n.is_integer() => n,
                    _ => {
                        root.error(path, vec![value(datum), text("is not an integer")]);
                        return;
                    }
                };

                // Exact comparison: the bound check never goes through
                // floating point.
                let big = match n.as_big() {
                    Some(b) => b,
                    None => {
                        root.error(path, vec![value(datum), text("is not an integer")]);
                        return;
                    }
                };
                let (min, max) = match scalar.int_bounds() {
                    Some(bounds) => bounds,
                    None => return,
                };
                if big < min || big > max {
                    root.error(
                        path,
                        vec![
                            value(&Value::String(n.format_decimal().into())),
                            text("is out of range of"),
                            text(&scalar.to_string()),
                        ],
                    );
                }
            }
        }
    }

    fn validate_sequence(
        datum: &Value,
        ty: &Ty,
        inner: Option<&Ty>,
        path: &[Rc<str>],
        root: &mut Root,
    ) -> Result<()> {
        let arr = match datum {
            Value::Array(a) => a.clone(),
            _ => {
                root.error(path, vec![value(datum), text("is not"), text(&ty.to_string())]);
                return Ok(());
            }
        };

        let inner = match inner {
            Some(inner) => inner,
            None => {
                if !arr.is_empty() {
                    root.error(path, vec![value(datum), text("is not an empty array")]);
                }
                return Ok(());
            }
        };

        with_cycle_check(root, Rc::as_ptr(&arr) as usize, ty, |root| {
            for (i, element) in arr.iter().enumerate() {
                Self::walk(element, inner, &child_path(path, i.to_string().into()), root)?;
            }
            Ok(())
        })
    }

    fn validate_tuple(
        datum: &Value,
        ty: &Ty,
        elems: &[Ty],
        rest: Option<&Ty>,
        path: &[Rc<str>],
        root: &mut Root,
    ) -> Result<()> {
        let arr = match datum {
            Value::Array(a) => a.clone(),
            _ => {
                root.error(path, vec![value(datum), text("is not tuple"), text(&ty.to_string())]);
                return Ok(());
            }
        };

        with_cycle_check(root, Rc::as_ptr(&arr) as usize, ty, |root| {
            for (i, elem_ty) in elems.iter().enumerate() {
                let element = if i < arr.len() {
                    &arr[i]
                } else {
                    &Value::Undefined
                };
                Self::walk(element, elem_ty, path, root)?;
            }
            if let Some(rest) = rest {
                for element in arr.iter().skip(elems.len()) {
                    Self::walk(element, rest, path, root)?;
                }
            }
            Ok(())
        })
    }

    fn validate_shape(
        datum: &Value,
        ty: &Ty,
        shape: &Shape,
        path: &[Rc<str>],
        root: &mut Root,
    ) -> Result<()> {
        let map = match datum {
            Value::Object(m) => m.clone(),
            _ => {
                root.error(path, vec![value(datum), text("is not"), text(&ty.to_string())]);
                return Ok(());
            }
        };

        with_cycle_check(root, Rc::as_ptr(&map) as usize, ty, |root| {
            let mut matched: BTreeSet<Value> = BTreeSet::new();

            for entry in &shape.entries {
                match &entry.key {
                    ShapeKey::Literal(key) => {
                        matched.insert(Value::String(key.clone()));
                        let v = &datum[key.as_ref()];
                        if entry.optional && v.is_undefined() {
                            continue;
                        }
                        Self::walk(v, &entry.ty, &child_path(path, key.clone()), root)?;
                    }
                    ShapeKey::Pattern(pattern) => {
                        for (data_key, v) in map.iter() {
                            if let Value::String(name) = data_key {
                                if pattern.is_match(name) {
                                    matched.insert(data_key.clone());
                                    Self::walk(v, &entry.ty, &child_path(path, name.clone()), root)?;
                                }
                            }
                        }
                    }
                }
            }

            // Unmatched keys route to the rest entry; without one, the
            // shape is open and they pass unvalidated.
            if let Some(rest) = &shape.rest {
                for (data_key, v) in map.iter() {
                    if matched.contains(data_key) {
                        continue;
                    }
                    let seg: Rc<str> = match data_key {
                        Value::String(s) => s.clone(),
                        other => other.to_string().into(),
                    };
                    Self::walk(v, rest, &child_path(path, seg), root)?;
                }
            }
            Ok(())
        })
    }
}

/// Short-circuits when this (data node, type node) pair is already on the
/// current descent path; the pair is released on the way back so sibling
/// subtrees check independently.
fn with_cycle_check(
    root: &mut Root,
    data_addr: usize,
    ty: &Ty,
    f: impl FnOnce(&mut Root) -> Result<()>,
) -> Result<()> {
    let pair = (data_addr, ty.addr());
    if root.visited.contains(&pair) {
        return Ok(());
    }
    root.visited.insert(pair);
    let outcome = f(root);
    root.visited.remove(&pair);
    outcome
}

/// Resolves a `ref()` against the root type. Shared with the mock engine.
pub(crate) fn resolve_reference(ty: &Ty, ref_path: &[Rc<str>], root: &Root) -> Result<Ty> {
    let resolved = if ref_path.is_empty() {
        root.ty.clone()
    } else {
        match root.ty.lookup(ref_path) {
            Some(t) => t,
            None => bail!("ref path `{}` is not found", ref_path.join(".")),
        }
    };
    if resolved == *ty {
        bail!("ref must not ref itself");
    }
    Ok(resolved)
}
