// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Lowering: expression tree in, executable schema out.
///
/// Every expression lowers to one of three operand kinds: an immediate
/// value (constant-folded with native arithmetic), a compiled type, or a
/// deferred expression of the root datum. An operator expression packs
/// into a single deferred expression as soon as either operand touches
/// `self`; that expression is then evaluated once per walk, not at compile
/// time. Coercing an operand to a type turns immediates into literal types
/// and deferred expressions into computed types.
use crate::expr::{BinOp, Decorator, Expr, LogicOp, Program, PropKey, UnaryOp};
use crate::number::Number;
use crate::schema::{
    eval_arith, eval_cmp, MatchArm, PatternType, Schema, SelfExpr, Shape, ShapeEntry, ShapeKey,
    Ty, Type, BUILTIN_TYPES,
};
use crate::utils;
use crate::value::Value;

use std::collections::BTreeMap;
use std::rc::Rc;

use log::debug;
use thiserror::Error;

/// Compilation failures. All of them fail the whole unit; there are no
/// per-datum compile errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("not implemented operator `{op}` on a type")]
    OperatorOnType { op: Rc<str> },

    #[error("not implemented decorator: {0}")]
    UnknownDecorator(Rc<str>),

    #[error("not implemented combinator: {0}")]
    UnknownCombinator(Rc<str>),

    #[error("unknown control key `{0}`")]
    UnknownControlKey(Rc<str>),

    #[error("`{0}` is not a function")]
    NotCallable(Rc<str>),

    #[error("invalid regex /{pattern}/: {message}")]
    InvalidPattern { pattern: Rc<str>, message: Rc<str> },

    #[error("{combinator}: {message}")]
    InvalidArguments {
        combinator: Rc<str>,
        message: Rc<str>,
    },

    #[error("invalid constant expression: {0}")]
    ConstEval(Rc<str>),

    #[error("member path segments must be identifiers, strings or numbers")]
    DynamicMemberPath,

    #[error("cannot access a member of a type")]
    MemberOfType,

    #[error("rest must be the last tuple element")]
    RestNotLast,
}

/// Lowering result of one subexpression.
enum Operand {
    /// A plain value, usable in constant folding or as a literal type.
    Imm(Value),
    /// A compiled type.
    Ty(Ty),
    /// A deferred ("packed") expression of the root datum.
    Deferred(SelfExpr),
}

impl Operand {
    fn into_ty(self) -> Ty {
        match self {
            Operand::Imm(v) => Ty::new(Type::Literal(v)),
            Operand::Ty(t) => t,
            Operand::Deferred(e) => Ty::new(Type::Computed(Rc::new(e))),
        }
    }

    fn into_self_expr(self, op: &str) -> Result<SelfExpr, CompileError> {
        match self {
            Operand::Imm(v) => Ok(SelfExpr::Const(v)),
            Operand::Deferred(e) => Ok(e),
            Operand::Ty(_) => Err(CompileError::OperatorOnType { op: op.into() }),
        }
    }

    fn is_ty(&self) -> bool {
        matches!(self, Operand::Ty(_))
    }
}

/// Lowers a program with a fresh declarations table.
pub fn lower(program: &Program) -> Result<Schema, CompileError> {
    Compiler::new().compile(program)
}

#[derive(Default)]
pub struct Compiler {
    declarations: BTreeMap<Rc<str>, Ty>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the declarations table before compilation, so library
    /// definitions can be shared across compilation units.
    pub fn with_declaration(mut self, name: &str, ty: Ty) -> Self {
        self.declarations.insert(name.into(), ty);
        self
    }

    /// Lowers a compilation unit: declarations populate the table by
    /// dotted path (later declarations win), the assignment becomes the
    /// schema root.
    pub fn compile(mut self, program: &Program) -> Result<Schema, CompileError> {
        debug!(
            "compile: {} declaration(s) + assignment",
            program.declares.len()
        );
        for declare in &program.declares {
            let ty = self.lower_type(&declare.value)?;
            let name: Rc<str> = declare.path.join(".").into();
            self.declarations.insert(name, ty);
        }
        let root = self.lower_type(&program.assignment)?;
        Ok(Schema::new(root, self.declarations))
    }

    fn lower_type(&mut self, expr: &Expr) -> Result<Ty, CompileError> {
        Ok(self.lower(expr)?.into_ty())
    }

    fn lower(&mut self, expr: &Expr) -> Result<Operand, CompileError> {
        match expr {
            Expr::Null => Ok(Operand::Imm(Value::Null)),
            Expr::Bool(b) => Ok(Operand::Imm(Value::Bool(*b))),
            Expr::Number(n) => Ok(Operand::Imm(Value::Number(n.clone()))),
            Expr::String(s) => Ok(Operand::Imm(Value::String(s.clone()))),

            Expr::Regex { pattern, flags } => {
                let compiled = PatternType::compile(pattern, flags).map_err(|e| {
                    CompileError::InvalidPattern {
                        pattern: pattern.clone(),
                        message: e.to_string().into(),
                    }
                })?;
                Ok(Operand::Ty(Ty::new(Type::Pattern(compiled))))
            }

            Expr::Ident(name) => match BUILTIN_TYPES.get(name.as_ref()) {
                Some(builtin) => Ok(Operand::Ty(builtin.to_ty())),
                None => Ok(Operand::Ty(Ty::new(Type::Definition(vec![name.clone()])))),
            },

            Expr::SelfRef => Ok(Operand::Deferred(SelfExpr::Root)),

            Expr::UnaryExpr { op, arg } => self.lower_unary(*op, arg),

            Expr::BinExpr { op, lhs, rhs } => {
                let lhs = self.lower_type(lhs)?;
                let rhs = self.lower_type(rhs)?;
                Ok(Operand::Ty(Ty::new(match op {
                    BinOp::Union => Type::Union(vec![lhs, rhs]),
                    BinOp::Intersection => Type::Intersection(vec![lhs, rhs]),
                })))
            }

            Expr::ArithExpr { op, lhs, rhs } => {
                let l = self.lower(lhs)?;
                let r = self.lower(rhs)?;
                let op_name = op.to_string();
                if l.is_ty() || r.is_ty() {
                    return Err(CompileError::OperatorOnType {
                        op: op_name.into(),
                    });
                }
                if let (Operand::Imm(a), Operand::Imm(b)) = (&l, &r) {
                    let v = eval_arith(*op, a, b)
                        .map_err(|e| CompileError::ConstEval(e.to_string().into()))?;
                    return Ok(Operand::Imm(v));
                }
                Ok(Operand::Deferred(SelfExpr::Arith {
                    op: *op,
                    lhs: Box::new(l.into_self_expr(&op_name)?),
                    rhs: Box::new(r.into_self_expr(&op_name)?),
                }))
            }

            Expr::BoolExpr { op, lhs, rhs } => {
                let l = self.lower(lhs)?;
                let r = self.lower(rhs)?;
                let op_name = op.to_string();
                if l.is_ty() || r.is_ty() {
                    return Err(CompileError::OperatorOnType {
                        op: op_name.into(),
                    });
                }
                if let (Operand::Imm(a), Operand::Imm(b)) = (&l, &r) {
                    return Ok(Operand::Imm(Value::Bool(eval_cmp(*op, a, b))));
                }
                Ok(Operand::Deferred(SelfExpr::Cmp {
                    op: *op,
                    lhs: Box::new(l.into_self_expr(&op_name)?),
                    rhs: Box::new(r.into_self_expr(&op_name)?),
                }))
            }

            Expr::LogicExpr { op, lhs, rhs } => {
                let l = self.lower(lhs)?;
                let r = self.lower(rhs)?;
                let op_name = op.to_string();
                if l.is_ty() || r.is_ty() {
                    return Err(CompileError::OperatorOnType {
                        op: op_name.into(),
                    });
                }
                if let (Operand::Imm(a), Operand::Imm(b)) = (&l, &r) {
                    let v = match op {
                        LogicOp::And if !a.is_truthy() => a.clone(),
                        LogicOp::Or if a.is_truthy() => a.clone(),
                        _ => b.clone(),
                    };
                    return Ok(Operand::Imm(v));
                }
                Ok(Operand::Deferred(SelfExpr::Logic {
                    op: *op,
                    lhs: Box::new(l.into_self_expr(&op_name)?),
                    rhs: Box::new(r.into_self_expr(&op_name)?),
                }))
            }

            Expr::Member { object, path } => self.lower_member(object, path),

            Expr::Call { callee, args } => self.lower_call(callee, args),

            Expr::Object(properties) => self.lower_object(properties),

            Expr::ArrayOf(None) => Ok(Operand::Ty(Ty::new(Type::Sequence(None)))),
            Expr::ArrayOf(Some(inner)) => {
                let inner = self.lower_type(inner)?;
                Ok(Operand::Ty(Ty::new(Type::Sequence(Some(inner)))))
            }

            Expr::Tuple(items) => {
                let mut elems = vec![];
                let mut rest = None;
                for (i, item) in items.iter().enumerate() {
                    if let Expr::Rest(inner) = item {
                        if i + 1 != items.len() {
                            return Err(CompileError::RestNotLast);
                        }
                        rest = Some(self.lower_type(inner)?);
                    } else {
                        elems.push(self.lower_type(item)?);
                    }
                }
                Ok(Operand::Ty(Ty::new(Type::Tuple { elems, rest })))
            }

            Expr::Enum(members) => {
                // Unlabeled members continue from the previous explicit
                // ordinal; the compiled enum carries the ordinals only.
                let mut values = vec![];
                let mut index: i64 = 0;
                for member in members {
                    if let Some(explicit) = member.value {
                        index = explicit;
                    }
                    values.push(Value::from(index));
                    index += 1;
                }
                Ok(Operand::Ty(Ty::new(Type::Enum(values))))
            }

            Expr::Match { scrutinee, cases } => {
                let scrutinee = match self.lower(scrutinee)? {
                    Operand::Deferred(e) => e,
                    Operand::Imm(v) => SelfExpr::Const(v),
                    Operand::Ty(_) => {
                        return Err(CompileError::InvalidArguments {
                            combinator: "match".into(),
                            message: "scrutinee must be an expression of self".into(),
                        })
                    }
                };
                let mut arms = vec![];
                for case in cases {
                    arms.push(MatchArm {
                        guard: self.lower_type(&case.guard)?,
                        result: self.lower_type(&case.value)?,
                    });
                }
                Ok(Operand::Ty(Ty::new(Type::Match {
                    scrutinee: Rc::new(scrutinee),
                    cases: arms,
                })))
            }

            Expr::Rest(inner) => {
                // Outside a tuple, `...T` means "every remaining element
                // is a T", i.e. a homogeneous sequence.
                let inner = self.lower_type(inner)?;
                Ok(Operand::Ty(Ty::new(Type::Sequence(Some(inner)))))
            }

            Expr::Optional(inner) => {
                let inner = self.lower_type(inner)?;
                Ok(Operand::Ty(Ty::new(Type::Optional(inner))))
            }
        }
    }

    fn lower_unary(&mut self, op: UnaryOp, arg: &Expr) -> Result<Operand, CompileError> {
        let operand = self.lower(arg)?;
        match (op, operand) {
            (UnaryOp::Not, Operand::Imm(v)) => Ok(Operand::Imm(Value::Bool(!v.is_truthy()))),

            (UnaryOp::Not, operand) => Ok(Operand::Ty(Ty::new(Type::Negation(operand.into_ty())))),

            (op, Operand::Imm(v)) => {
                let n = v
                    .as_number()
                    .map_err(|_| CompileError::ConstEval(format!("`{op}` on {v}").into()))?;
                let folded = match op {
                    UnaryOp::Neg => n.neg(),
                    UnaryOp::Pos => Some(n.clone()),
                    UnaryOp::BitNot => n.not(),
                    UnaryOp::Not => unreachable!(),
                };
                match folded {
                    Some(n) => Ok(Operand::Imm(Value::Number(n))),
                    None => Err(CompileError::ConstEval(format!("`{op}` on {v}").into())),
                }
            }

            (op, Operand::Deferred(e)) => Ok(Operand::Deferred(SelfExpr::Unary {
                op,
                arg: Box::new(e),
            })),

            (op, Operand::Ty(_)) => Err(CompileError::OperatorOnType {
                op: op.to_string().into(),
            }),
        }
    }

    fn lower_member(&mut self, object: &Expr, path: &[Expr]) -> Result<Operand, CompileError> {
        let mut segs: Vec<Rc<str>> = vec![];
        for seg in path {
            segs.push(match seg {
                Expr::Ident(s) | Expr::String(s) => s.clone(),
                Expr::Number(n) => n.format_decimal().into(),
                _ => return Err(CompileError::DynamicMemberPath),
            });
        }

        match object {
            Expr::SelfRef => Ok(Operand::Deferred(SelfExpr::Member {
                object: Box::new(SelfExpr::Root),
                path: segs,
            })),

            // A non-builtin head makes the whole dotted path a named
            // definition, resolved at walk time.
            Expr::Ident(name) if !BUILTIN_TYPES.contains_key(name.as_ref()) => {
                let mut full = vec![name.clone()];
                full.extend(segs);
                Ok(Operand::Ty(Ty::new(Type::Definition(full))))
            }

            _ => match self.lower(object)? {
                Operand::Imm(v) => {
                    let mut cur = v;
                    for seg in &segs {
                        cur = cur[seg.as_ref()].clone();
                    }
                    Ok(Operand::Imm(cur))
                }
                Operand::Deferred(e) => Ok(Operand::Deferred(SelfExpr::Member {
                    object: Box::new(e),
                    path: segs,
                })),
                Operand::Ty(_) => Err(CompileError::MemberOfType),
            },
        }
    }

    fn lower_call(&mut self, callee: &Expr, args: &[Expr]) -> Result<Operand, CompileError> {
        let name = match callee {
            Expr::Ident(name) => name.clone(),
            other => {
                return Err(CompileError::NotCallable(
                    format!("{other:?}").into(),
                ))
            }
        };

        let ty = match name.as_ref() {
            "anyOf" => Type::Union(self.lower_type_args(&name, args, 1)?),
            "oneOf" => Type::ExactlyOne(self.lower_type_args(&name, args, 1)?),
            "allOf" => Type::Intersection(self.lower_type_args(&name, args, 1)?),

            "not" => {
                let mut tys = self.lower_type_args(&name, args, 1)?;
                if tys.len() != 1 {
                    return Err(invalid_args(&name, "expects exactly one type"));
                }
                Type::Negation(tys.remove(0))
            }

            "eq" => {
                if args.len() != 1 {
                    return Err(invalid_args(&name, "expects exactly one value"));
                }
                match self.lower(&args[0])? {
                    Operand::Imm(v) => Type::Literal(v),
                    Operand::Deferred(e) => Type::Computed(Rc::new(e)),
                    Operand::Ty(_) => {
                        return Err(invalid_args(&name, "expects a value, not a type"))
                    }
                }
            }

            "optional" => {
                if args.len() != 1 {
                    return Err(invalid_args(&name, "expects exactly one type"));
                }
                Type::Optional(self.lower_type(&args[0])?)
            }

            "mock" => {
                let (alts, inner) = self.split_decorated_args(&name, args)?;
                Type::MockOverride { alts, inner }
            }

            "mockKey" => {
                let (alts, inner) = self.split_decorated_args(&name, args)?;
                let mut keys = vec![];
                for alt in alts {
                    match alt {
                        Value::String(s) => keys.push(s),
                        other => {
                            return Err(invalid_args(&name, &format!("key {other} is not a string")))
                        }
                    }
                }
                Type::MockKey { keys, inner }
            }

            "range" => {
                if args.len() < 2 {
                    return Err(invalid_args(&name, "arguments should not be empty"));
                }
                let (bounds, inner) = args.split_at(args.len() - 1);
                let mut nums = vec![];
                for bound in bounds {
                    nums.push(self.imm_number(&name, bound)?);
                }
                let (min, max) = range_bounds(&name, &nums)?;
                Type::Range {
                    min,
                    max,
                    inner: self.lower_type(&inner[0])?,
                }
            }

            "description" | "_" => {
                if args.len() != 2 {
                    return Err(invalid_args(&name, "expects (text, type)"));
                }
                let text = match self.lower(&args[0])? {
                    Operand::Imm(Value::String(s)) => s,
                    _ => return Err(invalid_args(&name, "text must be a string")),
                };
                Type::Description {
                    text,
                    inner: self.lower_type(&args[1])?,
                }
            }

            "definition" => {
                if args.len() != 1 {
                    return Err(invalid_args(&name, "expects a dotted name"));
                }
                match self.lower(&args[0])? {
                    Operand::Imm(Value::String(s)) => {
                        Type::Definition(s.split('.').map(Rc::from).collect())
                    }
                    _ => return Err(invalid_args(&name, "expects a dotted name")),
                }
            }

            "ref" => match args.len() {
                0 => Type::Reference(vec![]),
                1 => match self.lower(&args[0])? {
                    Operand::Imm(Value::String(s)) if !s.is_empty() => {
                        Type::Reference(s.split('.').map(Rc::from).collect())
                    }
                    Operand::Imm(Value::String(_)) => Type::Reference(vec![]),
                    _ => return Err(invalid_args(&name, "path must be a string")),
                },
                _ => return Err(invalid_args(&name, "expects at most one path")),
            },

            _ => return Err(CompileError::UnknownCombinator(name)),
        };

        Ok(Operand::Ty(Ty::new(ty)))
    }

    fn lower_type_args(
        &mut self,
        name: &Rc<str>,
        args: &[Expr],
        min: usize,
    ) -> Result<Vec<Ty>, CompileError> {
        if args.len() < min {
            return Err(invalid_args(name, "expects at least one type"));
        }
        args.iter().map(|a| self.lower_type(a)).collect()
    }

    /// `(alt, ..., type)` argument lists of the mock decorators.
    fn split_decorated_args(
        &mut self,
        name: &Rc<str>,
        args: &[Expr],
    ) -> Result<(Vec<Value>, Ty), CompileError> {
        if args.len() < 2 {
            return Err(invalid_args(name, "at least one mock should be specified"));
        }
        let (alts, inner) = args.split_at(args.len() - 1);
        let mut values = vec![];
        for alt in alts {
            match self.lower(alt)? {
                Operand::Imm(v) => values.push(v),
                _ => return Err(invalid_args(name, "alternatives must be values")),
            }
        }
        Ok((values, self.lower_type(&inner[0])?))
    }

    fn imm_number(&mut self, name: &Rc<str>, arg: &Expr) -> Result<Number, CompileError> {
        match self.lower(arg)? {
            Operand::Imm(Value::Number(n)) => Ok(n),
            _ => Err(invalid_args(name, "expects a number")),
        }
    }

    fn lower_object(&mut self, properties: &[crate::expr::Property]) -> Result<Operand, CompileError> {
        let mut entries = vec![];
        let mut rest = None;

        for prop in properties {
            let key = match &prop.key {
                PropKey::Regex { pattern, flags } => Some(self.compile_key(pattern, flags)?),
                PropKey::Ident(k) | PropKey::String(k) => {
                    let k = k.as_ref();
                    if utils::is_control_key(k) {
                        match k {
                            utils::REST_KEY => None,
                            utils::DEFINITIONS_KEY => continue,
                            _ => return Err(CompileError::UnknownControlKey(k.into())),
                        }
                    } else if utils::is_pattern_key(k) {
                        let (pattern, flags) = utils::match_key_pattern(k).ok_or_else(|| {
                            CompileError::InvalidPattern {
                                pattern: k.into(),
                                message: "pattern key is not a valid regex".into(),
                            }
                        })?;
                        Some(self.compile_key(pattern, flags)?)
                    } else {
                        Some(ShapeKey::Literal(utils::unescape_key(k).into()))
                    }
                }
            };

            let mut ty = self.lower_type(&prop.value)?;
            for decorator in &prop.decorators {
                ty = self.apply_decorator(decorator, ty)?;
            }

            match key {
                None => rest = Some(ty),
                Some(key) => entries.push(ShapeEntry {
                    key,
                    ty,
                    optional: prop.optional,
                }),
            }
        }

        Ok(Operand::Ty(Ty::new(Type::Shape(Shape { entries, rest }))))
    }

    fn compile_key(&self, pattern: &str, flags: &str) -> Result<ShapeKey, CompileError> {
        let compiled =
            PatternType::compile(pattern, flags).map_err(|e| CompileError::InvalidPattern {
                pattern: pattern.into(),
                message: e.to_string().into(),
            })?;
        Ok(ShapeKey::Pattern(compiled))
    }

    /// Decorators apply in declaration order, each wrapping the result of
    /// the previous one.
    fn apply_decorator(&mut self, decorator: &Decorator, inner: Ty) -> Result<Ty, CompileError> {
        let name = &decorator.name;
        let ty = match name.as_ref() {
            "range" => {
                if decorator.args.is_empty() {
                    return Err(invalid_args(name, "arguments should not be empty"));
                }
                let mut nums = vec![];
                for arg in &decorator.args {
                    nums.push(self.imm_number(name, arg)?);
                }
                let (min, max) = range_bounds(name, &nums)?;
                Type::Range { min, max, inner }
            }

            "description" | "_" => {
                if decorator.args.len() != 1 {
                    return Err(invalid_args(name, "expects one text argument"));
                }
                match self.lower(&decorator.args[0])? {
                    Operand::Imm(Value::String(text)) => Type::Description { text, inner },
                    _ => return Err(invalid_args(name, "text must be a string")),
                }
            }

            "mock" => {
                let alts = self.imm_args(name, &decorator.args)?;
                Type::MockOverride { alts, inner }
            }

            "mockKey" => {
                let mut keys = vec![];
                for v in self.imm_args(name, &decorator.args)? {
                    match v {
                        Value::String(s) => keys.push(s),
                        other => {
                            return Err(invalid_args(name, &format!("key {other} is not a string")))
                        }
                    }
                }
                Type::MockKey { keys, inner }
            }

            _ => return Err(CompileError::UnknownDecorator(name.clone())),
        };
        Ok(Ty::new(ty))
    }

    fn imm_args(&mut self, name: &Rc<str>, args: &[Expr]) -> Result<Vec<Value>, CompileError> {
        if args.is_empty() {
            return Err(invalid_args(name, "at least one mock should be specified"));
        }
        let mut values = vec![];
        for arg in args {
            match self.lower(arg)? {
                Operand::Imm(v) => values.push(v),
                _ => return Err(invalid_args(name, "arguments must be values")),
            }
        }
        Ok(values)
    }
}

fn invalid_args(combinator: &str, message: &str) -> CompileError {
    CompileError::InvalidArguments {
        combinator: combinator.into(),
        message: message.into(),
    }
}

/// `range(n)` spans 0..=n (or n..=0 for negative n); `range(min, max)` is
/// explicit.
fn range_bounds(name: &str, nums: &[Number]) -> Result<(Number, Number), CompileError> {
    let zero = Number::from(0i64);
    match nums {
        [n] => {
            if *n > zero {
                Ok((zero, n.clone()))
            } else {
                Ok((n.clone(), zero))
            }
        }
        [min, max] => Ok((min.clone(), max.clone())),
        _ => Err(invalid_args(name, "expects one or two bounds")),
    }
}
