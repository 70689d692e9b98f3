// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// The executable type algebra.
///
/// A schema is lowered once into a tree of [`Type`] nodes behind
/// reference-counted [`Ty`] handles. The same compiled tree drives both
/// engines: [`validate`] walks data against it accumulating structured
/// errors, [`mock`] walks it generating data that is then self-checked.
///
/// Types are immutable after construction. `Ty` equality is pointer
/// identity, which is what the engines key on for cycle detection and for
/// the "ref must not ref itself" check; structural equality over types is
/// never needed.
use crate::expr::{ArithOp, BoolOp, LogicOp, UnaryOp};
use crate::number::{BigInt, Number, F64_SAFE_INTEGER};
use crate::value::Value;

use core::cmp;
use core::fmt;
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{bail, Result};
use lazy_static::lazy_static;
use num_traits::One;
use regex::Regex;

pub mod error;
pub mod mock;
pub mod validate;

pub(crate) mod context;

/// Reference-counted handle to a compiled type node.
///
/// Cloning is cheap; equality and ordering are by node identity so that a
/// node can serve as a key in visited sets and expansion-budget maps.
pub struct Ty {
    t: Rc<Type>,
}

impl Ty {
    pub fn new(t: Type) -> Self {
        Ty { t: Rc::new(t) }
    }

    pub fn as_type(&self) -> &Type {
        &self.t
    }

    /// Stable address of the node, used as identity by the engines.
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.t) as usize
    }

    /// Descends `path` through shape entries with literal keys. Returns
    /// the entry's type as declared (decorator wrappers intact).
    pub fn lookup(&self, path: &[Rc<str>]) -> Option<Ty> {
        let mut cur = self.clone();
        for seg in path {
            let next = match cur.as_type() {
                Type::Shape(shape) => shape.entries.iter().find_map(|e| match &e.key {
                    ShapeKey::Literal(k) if k == seg => Some(e.ty.clone()),
                    _ => None,
                }),
                _ => None,
            }?;
            cur = next;
        }
        Some(cur)
    }

    /// Mock-key hints attached to this type, looking through the other
    /// decorator wrappers.
    pub(crate) fn mock_key_hints(&self) -> Option<&[Rc<str>]> {
        match self.as_type() {
            Type::MockKey { keys, .. } => Some(keys),
            Type::Description { inner, .. }
            | Type::Range { inner, .. }
            | Type::MockOverride { inner, .. }
            | Type::Optional(inner) => inner.mock_key_hints(),
            _ => None,
        }
    }
}

impl Clone for Ty {
    fn clone(&self) -> Self {
        Ty { t: self.t.clone() }
    }
}

impl fmt::Debug for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.t.as_ref(), f)
    }
}

impl cmp::PartialEq for Ty {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.t).eq(&Rc::as_ptr(&other.t))
    }
}

impl cmp::Eq for Ty {}

impl cmp::Ord for Ty {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        Rc::as_ptr(&self.t).cmp(&Rc::as_ptr(&other.t))
    }
}

impl cmp::PartialOrd for Ty {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.t.as_ref(), f)
    }
}

/// Scalar kinds. Integer widths carry their bit count; bounds are computed
/// with `BigInt` so the check is exact for every width, 128 bits included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    Any,
    Bool,
    Str,
    Float,
    Double,
    Int(u32),
    Uint(u32),
}

impl Scalar {
    /// Inclusive integer bounds; `None` for non-integer kinds.
    pub fn int_bounds(&self) -> Option<(BigInt, BigInt)> {
        match self {
            Scalar::Int(bits) => {
                let half = BigInt::one() << (bits - 1);
                Some((-half.clone(), half - BigInt::one()))
            }
            Scalar::Uint(bits) => {
                let max = (BigInt::one() << *bits) - BigInt::one();
                Some((BigInt::from(0), max))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Any => f.write_str("any"),
            Scalar::Bool => f.write_str("bool"),
            Scalar::Str => f.write_str("str"),
            Scalar::Float => f.write_str("float"),
            Scalar::Double => f.write_str("double"),
            Scalar::Int(bits) => write!(f, "int{bits}"),
            Scalar::Uint(bits) => write!(f, "uint{bits}"),
        }
    }
}

/// Compiled regex used for pattern types and pattern keys. Only the `i`
/// flag affects matching; other flags are kept for display.
#[derive(Debug, Clone)]
pub struct PatternType {
    pub source: Rc<str>,
    pub flags: Rc<str>,
    re: Regex,
}

impl PatternType {
    pub fn compile(source: &str, flags: &str) -> Result<Self, regex::Error> {
        let pattern = if flags.contains('i') {
            format!("(?i){source}")
        } else {
            source.to_string()
        };
        Ok(PatternType {
            source: source.into(),
            flags: flags.into(),
            re: Regex::new(&pattern)?,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.re.is_match(text)
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

/// A declared shape key: an exact name or a regex pattern swept over the
/// datum's keys.
#[derive(Debug, Clone)]
pub enum ShapeKey {
    Literal(Rc<str>),
    Pattern(PatternType),
}

#[derive(Debug, Clone)]
pub struct ShapeEntry {
    pub key: ShapeKey,
    pub ty: Ty,
    pub optional: bool,
}

/// Object shape: ordered declared entries plus an optional catch-all rest
/// entry for keys no declared entry matched.
#[derive(Debug, Clone)]
pub struct Shape {
    pub entries: Vec<ShapeEntry>,
    pub rest: Option<Ty>,
}

#[derive(Debug, Clone)]
pub struct MatchArm {
    pub guard: Ty,
    pub result: Ty,
}

#[derive(Debug)]
pub enum Type {
    /// Exact structural equality with a value.
    Literal(Value),

    /// Strings (and the decimal form of numbers) matching a regex.
    Pattern(PatternType),

    Scalar(Scalar),

    /// anyOf: success of any member.
    Union(Vec<Ty>),

    /// allOf: every member must accept the same datum. No direct mock.
    Intersection(Vec<Ty>),

    /// oneOf: exactly one member must accept. No direct mock.
    ExactlyOne(Vec<Ty>),

    /// not: succeeds iff the wrapped type fails. No direct mock.
    Negation(Ty),

    /// Accepts `Undefined`, otherwise defers to the wrapped type.
    Optional(Ty),

    /// Membership in a fixed value list (ordinals, after lowering an
    /// enumeration).
    Enum(Vec<Value>),

    /// Homogeneous array; `None` accepts only the empty array.
    Sequence(Option<Ty>),

    /// Positional types with an optional trailing rest-of-T slot.
    Tuple { elems: Vec<Ty>, rest: Option<Ty> },

    Shape(Shape),

    /// The root type, or a dotted sub-path of it. Resolving to the
    /// reference node itself is a fatal error.
    Reference(Vec<Rc<str>>),

    /// A pure expression of the root datum. Validation requires the
    /// current datum to equal its evaluation; mock returns the evaluation.
    Computed(Rc<SelfExpr>),

    /// Walk-time lookup in the declarations table, so forward and mutually
    /// recursive definitions resolve.
    Definition(Vec<Rc<str>>),

    /// Discriminated match: the first case whose guard accepts the
    /// computed scrutinee selects the result type. No direct mock.
    Match {
        scrutinee: Rc<SelfExpr>,
        cases: Vec<MatchArm>,
    },

    /// Bounds on a number's value or a string's/array's length, then the
    /// wrapped type. No direct mock.
    Range { min: Number, max: Number, inner: Ty },

    /// Documentation text; transparent to both engines.
    Description { text: Rc<str>, inner: Ty },

    /// Literal alternatives used only when mocking; validation sees the
    /// wrapped type.
    MockOverride { alts: Vec<Value>, inner: Ty },

    /// Candidate key names used when mocking pattern/rest entries;
    /// validation sees the wrapped type.
    MockKey { keys: Vec<Rc<str>>, inner: Ty },

    /// Datum must be exactly undefined.
    Nil,

    /// Key must be absent from its container.
    Absent,

    /// Always errors; as a rest entry this closes a shape.
    Never,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, name: &str, tys: &[Ty]) -> fmt::Result {
            write!(f, "{name}(")?;
            for (i, t) in tys.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{t}")?;
            }
            f.write_str(")")
        }

        match self {
            Type::Literal(v) => write!(f, "{v}"),
            Type::Pattern(p) => write!(f, "{p}"),
            Type::Scalar(s) => write!(f, "{s}"),
            Type::Union(tys) => list(f, "anyOf", tys),
            Type::Intersection(tys) => list(f, "allOf", tys),
            Type::ExactlyOne(tys) => list(f, "oneOf", tys),
            Type::Negation(t) => write!(f, "not({t})"),
            Type::Optional(t) => write!(f, "{t}?"),
            Type::Enum(values) => {
                f.write_str("enum(")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str(")")
            }
            Type::Sequence(None) => f.write_str("[]"),
            Type::Sequence(Some(t)) => write!(f, "[{t}]"),
            Type::Tuple { elems, rest } => {
                f.write_str("(")?;
                for (i, t) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{t}")?;
                }
                if let Some(rest) = rest {
                    if !elems.is_empty() {
                        f.write_str(", ")?;
                    }
                    write!(f, "...{rest}")?;
                }
                f.write_str(")")
            }
            Type::Shape(shape) => {
                f.write_str("{ ")?;
                for (i, entry) in shape.entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match &entry.key {
                        ShapeKey::Literal(k) => write!(f, "{k}")?,
                        ShapeKey::Pattern(p) => write!(f, "{p}")?,
                    }
                    if entry.optional {
                        f.write_str("?")?;
                    }
                    write!(f, ": {}", entry.ty)?;
                }
                if let Some(rest) = &shape.rest {
                    if !shape.entries.is_empty() {
                        f.write_str(", ")?;
                    }
                    write!(f, "$rest: {rest}")?;
                }
                f.write_str(" }")
            }
            Type::Reference(path) => {
                if path.is_empty() {
                    f.write_str("ref()")
                } else {
                    write!(f, "ref('{}')", path.join("."))
                }
            }
            Type::Computed(e) => write!(f, "{e}"),
            Type::Definition(path) => f.write_str(&path.join(".")),
            Type::Match { scrutinee, cases } => {
                write!(f, "match {scrutinee} {{ ")?;
                for (i, arm) in cases.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "case {} => {}", arm.guard, arm.result)?;
                }
                f.write_str(" }")
            }
            Type::Range { min, max, inner } => {
                write!(f, "range({}, {}, {inner})", min.format_decimal(), max.format_decimal())
            }
            Type::Description { inner, .. } => write!(f, "{inner}"),
            Type::MockOverride { inner, .. } => write!(f, "{inner}"),
            Type::MockKey { inner, .. } => write!(f, "{inner}"),
            Type::Nil => f.write_str("nil"),
            Type::Absent => f.write_str("absent"),
            Type::Never => f.write_str("never"),
        }
    }
}

/// A pure expression of the root datum, produced by the lowering compiler
/// when an operator expression touches `self`. Evaluated once per walk
/// against the (possibly partially built) root datum.
#[derive(Debug)]
pub enum SelfExpr {
    /// The root datum itself.
    Root,

    Const(Value),

    Member {
        object: Box<SelfExpr>,
        path: Vec<Rc<str>>,
    },

    Unary {
        op: UnaryOp,
        arg: Box<SelfExpr>,
    },

    Arith {
        op: ArithOp,
        lhs: Box<SelfExpr>,
        rhs: Box<SelfExpr>,
    },

    Cmp {
        op: BoolOp,
        lhs: Box<SelfExpr>,
        rhs: Box<SelfExpr>,
    },

    Logic {
        op: LogicOp,
        lhs: Box<SelfExpr>,
        rhs: Box<SelfExpr>,
    },
}

impl SelfExpr {
    pub fn eval(&self, root: &Value) -> Result<Value> {
        match self {
            SelfExpr::Root => Ok(root.clone()),
            SelfExpr::Const(v) => Ok(v.clone()),
            SelfExpr::Member { object, path } => {
                let mut cur = object.eval(root)?;
                for seg in path {
                    cur = match (&cur, seg.parse::<usize>()) {
                        (Value::Array(_), Ok(index)) => cur[index].clone(),
                        _ => cur[seg.as_ref()].clone(),
                    };
                }
                Ok(cur)
            }
            SelfExpr::Unary { op, arg } => {
                let v = arg.eval(root)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!v.is_truthy())),
                    UnaryOp::Neg => match v.as_number()?.neg() {
                        Some(n) => Ok(Value::Number(n)),
                        None => bail!("cannot negate {v}"),
                    },
                    UnaryOp::Pos => Ok(Value::Number(v.as_number()?.clone())),
                    UnaryOp::BitNot => match v.as_number()?.not() {
                        Some(n) => Ok(Value::Number(n)),
                        None => bail!("cannot complement {v}"),
                    },
                }
            }
            SelfExpr::Arith { op, lhs, rhs } => {
                let a = lhs.eval(root)?;
                let b = rhs.eval(root)?;
                eval_arith(*op, &a, &b)
            }
            SelfExpr::Cmp { op, lhs, rhs } => {
                let a = lhs.eval(root)?;
                let b = rhs.eval(root)?;
                Ok(Value::Bool(eval_cmp(*op, &a, &b)))
            }
            SelfExpr::Logic { op, lhs, rhs } => {
                let a = lhs.eval(root)?;
                match op {
                    LogicOp::And if !a.is_truthy() => Ok(a),
                    LogicOp::Or if a.is_truthy() => Ok(a),
                    _ => rhs.eval(root),
                }
            }
        }
    }
}

/// Shared by the lowering compiler (constant folding) and the computed
/// evaluator, so folded and deferred arithmetic agree.
pub(crate) fn eval_arith(op: ArithOp, a: &Value, b: &Value) -> Result<Value> {
    if op == ArithOp::Add {
        if let (Value::String(x), Value::String(y)) = (a, b) {
            return Ok(Value::String(format!("{x}{y}").into()));
        }
    }

    let (x, y) = (a.as_number()?, b.as_number()?);
    let n = match op {
        ArithOp::Add => x.add(y)?,
        ArithOp::Sub => x.sub(y)?,
        ArithOp::Mul => x.mul(y)?,
        ArithOp::Div => x.divide(y)?,
        ArithOp::Mod => x.modulo(y)?,
        ArithOp::Shl => match x.lsh(y) {
            Some(n) => n,
            None => bail!("invalid shift"),
        },
        ArithOp::Shr => match x.rsh(y) {
            Some(n) => n,
            None => bail!("invalid shift"),
        },
        ArithOp::Xor => match x.xor(y) {
            Some(n) => n,
            None => bail!("xor on non-integers"),
        },
    };
    Ok(Value::Number(n))
}

pub(crate) fn eval_cmp(op: BoolOp, a: &Value, b: &Value) -> bool {
    match op {
        BoolOp::Eq => a == b,
        BoolOp::Ne => a != b,
        BoolOp::Lt => a < b,
        BoolOp::Le => a <= b,
        BoolOp::Gt => a > b,
        BoolOp::Ge => a >= b,
    }
}

impl fmt::Display for SelfExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelfExpr::Root => f.write_str("self"),
            SelfExpr::Const(v) => write!(f, "{v}"),
            SelfExpr::Member { object, path } => {
                write!(f, "{object}")?;
                for seg in path {
                    write!(f, ".{seg}")?;
                }
                Ok(())
            }
            SelfExpr::Unary { op, arg } => write!(f, "{op}{arg}"),
            SelfExpr::Arith { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
            SelfExpr::Cmp { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
            SelfExpr::Logic { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
        }
    }
}

/// Validates floats: finite and exactly representable (the safe-integer
/// window for integral values).
pub(crate) fn is_float_value(n: &Number) -> bool {
    match n.as_f64() {
        Some(f) => f.abs() <= F64_SAFE_INTEGER,
        None => false,
    }
}

/// A compiled compilation unit: the root type plus its declarations table.
///
/// Immutable and reusable across any number of validate/mock calls; each
/// call builds its own fresh walk state.
#[derive(Debug, Clone)]
pub struct Schema {
    root: Ty,
    declarations: Rc<BTreeMap<Rc<str>, Ty>>,
}

impl Schema {
    pub(crate) fn new(root: Ty, declarations: BTreeMap<Rc<str>, Ty>) -> Self {
        Schema {
            root,
            declarations: Rc::new(declarations),
        }
    }

    /// Wraps a hand-built type with an empty declarations table.
    pub fn from_type(root: Ty) -> Self {
        Schema::new(root, BTreeMap::new())
    }

    pub fn root(&self) -> &Ty {
        &self.root
    }

    pub fn declarations(&self) -> &BTreeMap<Rc<str>, Ty> {
        &self.declarations
    }

    pub(crate) fn declarations_rc(&self) -> Rc<BTreeMap<Rc<str>, Ty>> {
        self.declarations.clone()
    }

    /// Validates `value`, returning every data-level defect found.
    /// `Err` is reserved for schema-malformed conditions.
    pub fn validate(&self, value: &Value) -> Result<Vec<error::ValidationError>> {
        validate::Validator::validate(value, self)
    }

    /// Generates a datum accepted by this schema, or fails: there is no
    /// meaningful partial mock.
    pub fn mock(&self) -> Result<Value> {
        mock::MockGenerator::mock(self)
    }

    /// Like [`Schema::mock`] with an explicit per-type expansion budget
    /// for recursive types.
    pub fn mock_with_budget(&self, budget: u32) -> Result<Value> {
        mock::MockGenerator::mock_with_budget(self, budget)
    }
}

/// Builtin resolution result for a type name.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Builtin {
    Scalar(Scalar),
    Nil,
    Absent,
    Never,
}

impl Builtin {
    pub(crate) fn to_ty(self) -> Ty {
        match self {
            Builtin::Scalar(s) => Ty::new(Type::Scalar(s)),
            Builtin::Nil => Ty::new(Type::Nil),
            Builtin::Absent => Ty::new(Type::Absent),
            Builtin::Never => Ty::new(Type::Never),
        }
    }
}

lazy_static! {
    /// Builtin type names and their aliases.
    pub(crate) static ref BUILTIN_TYPES: BTreeMap<&'static str, Builtin> = {
        let mut m = BTreeMap::new();

        m.insert("any", Builtin::Scalar(Scalar::Any));
        m.insert("bool", Builtin::Scalar(Scalar::Bool));
        m.insert("str", Builtin::Scalar(Scalar::Str));
        m.insert("float", Builtin::Scalar(Scalar::Float));
        m.insert("double", Builtin::Scalar(Scalar::Double));
        m.insert("number", Builtin::Scalar(Scalar::Double));

        m.insert("int8", Builtin::Scalar(Scalar::Int(8)));
        m.insert("byte", Builtin::Scalar(Scalar::Int(8)));
        m.insert("int16", Builtin::Scalar(Scalar::Int(16)));
        m.insert("short", Builtin::Scalar(Scalar::Int(16)));
        m.insert("int32", Builtin::Scalar(Scalar::Int(32)));
        m.insert("int", Builtin::Scalar(Scalar::Int(32)));
        m.insert("int64", Builtin::Scalar(Scalar::Int(64)));
        m.insert("long", Builtin::Scalar(Scalar::Int(64)));
        m.insert("int128", Builtin::Scalar(Scalar::Int(128)));
        m.insert("i128", Builtin::Scalar(Scalar::Int(128)));

        m.insert("uint8", Builtin::Scalar(Scalar::Uint(8)));
        m.insert("uint16", Builtin::Scalar(Scalar::Uint(16)));
        m.insert("char", Builtin::Scalar(Scalar::Uint(16)));
        m.insert("uint32", Builtin::Scalar(Scalar::Uint(32)));
        m.insert("uint", Builtin::Scalar(Scalar::Uint(32)));
        m.insert("uint64", Builtin::Scalar(Scalar::Uint(64)));
        m.insert("uint128", Builtin::Scalar(Scalar::Uint(128)));

        m.insert("nil", Builtin::Nil);
        m.insert("absent", Builtin::Absent);
        m.insert("never", Builtin::Never);

        m
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_bounds_are_exact() {
        let (min, max) = Scalar::Int(8).int_bounds().unwrap();
        assert_eq!(min, BigInt::from(-128));
        assert_eq!(max, BigInt::from(127));

        let (min, max) = Scalar::Uint(128).int_bounds().unwrap();
        assert_eq!(min, BigInt::from(0));
        assert_eq!(max, (BigInt::one() << 128u32) - BigInt::one());

        assert!(Scalar::Str.int_bounds().is_none());
    }

    #[test]
    fn ty_identity_not_structural() {
        let a = Ty::new(Type::Scalar(Scalar::Bool));
        let b = Ty::new(Type::Scalar(Scalar::Bool));
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }
}
