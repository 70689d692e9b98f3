// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::schema::context::{child_path, Root};
use crate::schema::validate::{resolve_reference, Validator};
use crate::schema::{Scalar, Schema, ShapeKey, Ty, Type};
use crate::value::Value;

use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{bail, Result};
use log::debug;
use rand::{thread_rng, Rng};

/// Default per-type expansion budget for recursive types.
const DEFAULT_BUDGET: u32 = 2;

/// Upper element count for generated sequences.
const SEQUENCE_MAX: usize = 10;

/// Generates a datum accepted by a schema.
///
/// The walk mirrors the validator's dispatch. Containers are written into
/// the partially built root datum before their members are generated, so
/// computed fields can read already-generated siblings. Re-entering a
/// container type that is still expanding consumes that node's expansion
/// budget; an exhausted budget reuses the node's placeholder, which is what
/// makes generation terminate for self-referential types.
pub struct MockGenerator;

impl MockGenerator {
    pub fn mock(schema: &Schema) -> Result<Value> {
        Self::mock_with_budget(schema, DEFAULT_BUDGET)
    }

    pub fn mock_with_budget(schema: &Schema, budget: u32) -> Result<Value> {
        debug!("mock: root type {}", schema.root());
        let mut root = Root::for_mock(schema, budget);
        let generated = Self::walk(schema.root(), &[], &mut root)?;

        // Mock output must always be accepted by the type it was generated
        // from; anything else is a bug or an unmockable type.
        let errors = Validator::validate(&generated, schema)?;
        if !errors.is_empty() {
            let rendered: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            bail!(
                "mock output failed self-validation: {}",
                rendered.join("; ")
            );
        }
        Ok(generated)
    }

    fn walk(ty: &Ty, path: &[Rc<str>], root: &mut Root) -> Result<Value> {
        match ty.as_type() {
            Type::Literal(v) => Ok(v.clone()),

            Type::Pattern(pattern) => {
                Ok(Value::String(sample_pattern(&pattern.source)?.into()))
            }

            Type::Scalar(scalar) => Ok(Self::mock_scalar(*scalar)),

            Type::Union(members) => {
                let pick = Self::select(ty, members, root)?;
                Self::walk(&pick, path, root)
            }

            Type::Intersection(_) => bail!(r#""allOf" must be used with "mock" type"#),
            Type::ExactlyOne(_) => bail!(r#""oneOf" must be used with "mock" type"#),
            Type::Negation(_) => bail!(r#""not" must be used with "mock" type"#),
            Type::Match { .. } => bail!(r#""match" must be used with "mock" type"#),
            Type::Range { .. } => bail!(r#""range" must be used with "mock" type"#),

            Type::Optional(inner) => Self::walk(inner, path, root),

            Type::Enum(values) => {
                let mut rng = thread_rng();
                Ok(values[rng.gen_range(0..values.len())].clone())
            }

            Type::Sequence(None) => Ok(Value::new_array()),

            Type::Sequence(Some(inner)) => {
                let inner = inner.clone();
                Self::mock_container(ty, path, root, Value::new_array(), |root| {
                    let mut rng = thread_rng();
                    let count = rng.gen_range(1..=SEQUENCE_MAX);
                    drop(rng);
                    let mut elements = vec![];
                    for i in 0..count {
                        let seg: Rc<str> = i.to_string().into();
                        let element = Self::walk(&inner, &child_path(path, seg.clone()), root)?;
                        write_at(root, &child_path(path, seg), element.clone())?;
                        elements.push(element);
                    }
                    Ok(Value::from(elements))
                })
            }

            Type::Tuple { elems, rest } => {
                let elems = elems.clone();
                let rest = rest.clone();
                Self::mock_container(ty, path, root, Value::new_array(), |root| {
                    let mut elements = vec![];
                    for (i, elem_ty) in elems.iter().enumerate() {
                        let seg: Rc<str> = i.to_string().into();
                        let element = Self::walk(elem_ty, &child_path(path, seg.clone()), root)?;
                        write_at(root, &child_path(path, seg), element.clone())?;
                        elements.push(element);
                    }
                    if let Some(rest) = &rest {
                        let extra = thread_rng().gen_range(1..=3);
                        for i in 0..extra {
                            let seg: Rc<str> = (elems.len() + i).to_string().into();
                            let element = Self::walk(rest, &child_path(path, seg.clone()), root)?;
                            write_at(root, &child_path(path, seg), element.clone())?;
                            elements.push(element);
                        }
                    }
                    Ok(Value::from(elements))
                })
            }

            Type::Shape(shape) => {
                let shape = shape.clone();
                Self::mock_container(ty, path, root, Value::new_object(), |root| {
                    let mut object = BTreeMap::new();
                    for entry in &shape.entries {
                        let key: Rc<str> = match &entry.key {
                            ShapeKey::Literal(k) => k.clone(),
                            ShapeKey::Pattern(pattern) => match entry.ty.mock_key_hints() {
                                Some(hints) => {
                                    hints[thread_rng().gen_range(0..hints.len())].clone()
                                }
                                None => sample_pattern(&pattern.source)?.into(),
                            },
                        };
                        let v = Self::walk(&entry.ty, &child_path(path, key.clone()), root)?;
                        if v.is_undefined() {
                            continue;
                        }
                        write_at(root, &child_path(path, key.clone()), v.clone())?;
                        object.insert(Value::String(key), v);
                    }
                    if let Some(rest) = &shape.rest {
                        let key: Rc<str> = match rest.mock_key_hints() {
                            Some(hints) => hints[thread_rng().gen_range(0..hints.len())].clone(),
                            None => bail!(r#""$rest" should mock with "mockKey""#),
                        };
                        let v = Self::walk(rest, &child_path(path, key.clone()), root)?;
                        if !v.is_undefined() {
                            write_at(root, &child_path(path, key.clone()), v.clone())?;
                            object.insert(Value::String(key), v);
                        }
                    }
                    Ok(Value::from(object))
                })
            }

            Type::Reference(ref_path) => {
                let resolved = resolve_reference(ty, ref_path, root)?;
                Self::walk(&resolved, path, root)
            }

            Type::Computed(expr) => {
                let data = root.data.clone();
                expr.eval(&data)
            }

            Type::Definition(name_path) => {
                let name: Rc<str> = name_path.join(".").into();
                match root.declarations.get(&name).cloned() {
                    Some(declared) => Self::walk(&declared, path, root),
                    None => bail!("not implemented type: {name}"),
                }
            }

            Type::MockOverride { alts, .. } => {
                let mut rng = thread_rng();
                Ok(alts[rng.gen_range(0..alts.len())].clone())
            }

            Type::Description { inner, .. } | Type::MockKey { inner, .. } => {
                Self::walk(inner, path, root)
            }

            Type::Nil | Type::Absent | Type::Never => Ok(Value::Undefined),
        }
    }

    /// Container generation under the expansion-budget discipline: the
    /// placeholder is registered and written into the root datum before any
    /// member is generated, and the expansion maps are scoped so sibling
    /// subtrees are unaffected.
    fn mock_container(
        ty: &Ty,
        path: &[Rc<str>],
        root: &mut Root,
        placeholder: Value,
        build: impl FnOnce(&mut Root) -> Result<Value>,
    ) -> Result<Value> {
        let addr = ty.addr();
        if root.markers.contains_key(&addr) {
            let remaining = root.budgets.get(&addr).copied().unwrap_or(root.budget);
            if remaining == 0 {
                // Forced reuse terminates the recursion.
                return Ok(root.markers[&addr].clone());
            }
            root.budgets.insert(addr, remaining - 1);
        }

        root.scoped_expansion(|root| {
            root.markers.insert(addr, placeholder.clone());
            write_at(root, path, placeholder)?;
            build(root)
        })
    }

    /// Union member selection. Members that can recurse consume their
    /// expansion budget and drop out once it is exhausted; terminal members
    /// stay eligible, which is what lets `anyOf(ref(), null)` bottom out.
    fn select(ty: &Ty, members: &[Ty], root: &mut Root) -> Result<Ty> {
        let mut eligible = vec![];
        for member in members {
            if is_terminal(member) {
                eligible.push(member.clone());
                continue;
            }
            let addr = member.addr();
            let remaining = root.budgets.get(&addr).copied().unwrap_or(root.budget);
            if remaining > 0 {
                root.budgets.insert(addr, remaining - 1);
                eligible.push(member.clone());
            }
        }
        if eligible.is_empty() {
            bail!("cycle exceeds the expansion budget while mocking {ty}");
        }
        let mut rng = thread_rng();
        Ok(eligible[rng.gen_range(0..eligible.len())].clone())
    }

    fn mock_scalar(scalar: Scalar) -> Value {
        let mut rng = thread_rng();
        match scalar {
            Scalar::Any => {
                let pool = [
                    Value::from(1u64),
                    Value::from("string"),
                    Value::Null,
                    Value::from(vec![Value::from(1u64), Value::from(2u64), Value::from(3u64)]),
                ];
                pool[rng.gen_range(0..pool.len())].clone()
            }
            Scalar::Bool => Value::Bool(rng.gen_range(0..=1) == 1),
            Scalar::Str => {
                let len = rng.gen_range(6..=10);
                let s: String = (0..len)
                    .map(|_| {
                        const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
                        CHARS[rng.gen_range(0..CHARS.len())] as char
                    })
                    .collect();
                Value::String(s.into())
            }
            Scalar::Float | Scalar::Double => Value::from(rng.gen_range(-1000.0..1000.0)),
            Scalar::Int(_) => Value::from(rng.gen_range(-127i64..=127)),
            Scalar::Uint(_) => Value::from(rng.gen_range(0u64..=255)),
        }
    }
}

/// Whether a union member can never re-enter a container (and so is exempt
/// from budget filtering).
fn is_terminal(ty: &Ty) -> bool {
    matches!(
        ty.as_type(),
        Type::Literal(_)
            | Type::Pattern(_)
            | Type::Scalar(_)
            | Type::Enum(_)
            | Type::MockOverride { .. }
            | Type::Nil
            | Type::Absent
            | Type::Never
    )
}

/// Writes a generated node into the partially built root datum.
fn write_at(root: &mut Root, path: &[Rc<str>], v: Value) -> Result<()> {
    let segs: Vec<&str> = path.iter().map(|s| s.as_ref()).collect();
    *root.data.make_or_get_value_mut(&segs)? = v;
    Ok(())
}

/// Generates a string matching a practical subset of regex syntax:
/// literals, `.`, escapes (`\d`, `\w`, `\s`, `\D`, `\W`, `\S`), character
/// classes with ranges and negation, groups, top-level alternation, and
/// the `? * + {m} {m,} {m,n}` quantifiers. Anchors are skipped.
/// Unsupported constructs fail rather than produce a non-matching string.
fn sample_pattern(source: &str) -> Result<String> {
    let chars: Vec<char> = source.chars().collect();
    let mut rng = thread_rng();
    let mut pos = 0usize;
    let out = sample_alternation(&chars, &mut pos, &mut rng, 0)?;
    if pos != chars.len() {
        bail!("cannot mock regex /{source}/");
    }
    Ok(out)
}

fn sample_alternation(
    chars: &[char],
    pos: &mut usize,
    rng: &mut impl Rng,
    depth: u32,
) -> Result<String> {
    let mut branches = vec![sample_sequence(chars, pos, rng, depth)?];
    while *pos < chars.len() && chars[*pos] == '|' {
        *pos += 1;
        branches.push(sample_sequence(chars, pos, rng, depth)?);
    }
    Ok(branches[rng.gen_range(0..branches.len())].clone())
}

fn sample_sequence(
    chars: &[char],
    pos: &mut usize,
    rng: &mut impl Rng,
    depth: u32,
) -> Result<String> {
    let mut out = String::new();
    while *pos < chars.len() {
        match chars[*pos] {
            '|' => break,
            ')' if depth > 0 => break,
            '^' | '$' => {
                *pos += 1;
            }
            _ => {
                let atom = sample_atom(chars, pos, rng, depth)?;
                let (lo, hi) = sample_quantifier(chars, pos)?;
                let n = if lo == hi {
                    lo
                } else {
                    rng.gen_range(lo..=hi)
                };
                for _ in 0..n {
                    out.push_str(&atom);
                }
            }
        }
    }
    Ok(out)
}

fn sample_atom(
    chars: &[char],
    pos: &mut usize,
    rng: &mut impl Rng,
    depth: u32,
) -> Result<String> {
    match chars[*pos] {
        '(' => {
            *pos += 1;
            // Skip a (?:  group prefix; other (?...) forms are unsupported.
            if *pos + 1 < chars.len() && chars[*pos] == '?' {
                if chars[*pos + 1] == ':' {
                    *pos += 2;
                } else {
                    bail!("cannot mock regex group");
                }
            }
            let inner = sample_alternation(chars, pos, rng, depth + 1)?;
            if *pos >= chars.len() || chars[*pos] != ')' {
                bail!("cannot mock regex: unbalanced group");
            }
            *pos += 1;
            Ok(inner)
        }
        '[' => {
            *pos += 1;
            let mut negated = false;
            if *pos < chars.len() && chars[*pos] == '^' {
                negated = true;
                *pos += 1;
            }
            let mut candidates: Vec<char> = vec![];
            while *pos < chars.len() && chars[*pos] != ']' {
                let c = if chars[*pos] == '\\' {
                    *pos += 1;
                    match escape_candidates(chars[*pos]) {
                        Some(set) => {
                            candidates.extend(set);
                            *pos += 1;
                            continue;
                        }
                        None => chars[*pos],
                    }
                } else {
                    chars[*pos]
                };
                if *pos + 2 < chars.len() && chars[*pos + 1] == '-' && chars[*pos + 2] != ']' {
                    let hi = chars[*pos + 2];
                    for v in (c as u32)..=(hi as u32) {
                        if let Some(ch) = char::from_u32(v) {
                            candidates.push(ch);
                        }
                    }
                    *pos += 3;
                } else {
                    candidates.push(c);
                    *pos += 1;
                }
            }
            if *pos >= chars.len() {
                bail!("cannot mock regex: unbalanced class");
            }
            *pos += 1;
            if negated {
                const PRINTABLE: &str =
                    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_";
                candidates = PRINTABLE.chars().filter(|c| !candidates.contains(c)).collect();
            }
            if candidates.is_empty() {
                bail!("cannot mock regex: empty class");
            }
            Ok(candidates[rng.gen_range(0..candidates.len())].to_string())
        }
        '\\' => {
            *pos += 1;
            if *pos >= chars.len() {
                bail!("cannot mock regex: dangling escape");
            }
            let c = chars[*pos];
            *pos += 1;
            match escape_candidates(c) {
                Some(set) => Ok(set[rng.gen_range(0..set.len())].to_string()),
                None => Ok(c.to_string()),
            }
        }
        '.' => {
            *pos += 1;
            Ok("a".to_string())
        }
        '*' | '+' | '?' | '{' => bail!("cannot mock regex: dangling quantifier"),
        c => {
            *pos += 1;
            Ok(c.to_string())
        }
    }
}

fn escape_candidates(c: char) -> Option<Vec<char>> {
    match c {
        'd' => Some(('0'..='9').collect()),
        'w' => Some(
            ('a'..='z')
                .chain('A'..='Z')
                .chain('0'..='9')
                .chain(std::iter::once('_'))
                .collect(),
        ),
        's' => Some(vec![' ']),
        'D' => Some(('a'..='z').collect()),
        'W' => Some(vec!['#', '-', '!']),
        'S' => Some(('a'..='z').collect()),
        _ => None,
    }
}

/// Parses a quantifier after an atom; (1, 1) when absent. Unbounded forms
/// are capped at a couple of repetitions.
fn sample_quantifier(chars: &[char], pos: &mut usize) -> Result<(usize, usize)> {
    if *pos >= chars.len() {
        return Ok((1, 1));
    }
    let bounds = match chars[*pos] {
        '?' => (0, 1),
        '*' => (0, 2),
        '+' => (1, 3),
        '{' => {
            let close = chars[*pos..]
                .iter()
                .position(|c| *c == '}')
                .map(|i| *pos + i);
            let close = match close {
                Some(i) => i,
                None => bail!("cannot mock regex: unbalanced repetition"),
            };
            let body: String = chars[*pos + 1..close].iter().collect();
            *pos = close;
            let parts: Vec<&str> = body.split(',').collect();
            match parts.as_slice() {
                [m] => {
                    let m: usize = m.parse().map_err(|_| anyhow::anyhow!("bad repetition"))?;
                    (m, m)
                }
                [m, ""] => {
                    let m: usize = m.parse().map_err(|_| anyhow::anyhow!("bad repetition"))?;
                    (m, m + 2)
                }
                [m, n] => {
                    let m: usize = m.parse().map_err(|_| anyhow::anyhow!("bad repetition"))?;
                    let n: usize = n.parse().map_err(|_| anyhow::anyhow!("bad repetition"))?;
                    (m, n.min(m + 2).max(m))
                }
                _ => bail!("cannot mock regex: bad repetition"),
            }
        }
        _ => return Ok((1, 1)),
    };
    *pos += 1;
    Ok(bounds)
}
