// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// The expression tree handed to the lowering compiler by the external
/// textual parser. Nodes are immutable, owned by the tree, and carry no
/// behavior; all semantics live in the compiled type algebra.
use crate::number::Number;

use std::rc::Rc;

pub type Ident = Rc<str>;

/// One compilation unit: zero or more named declarations followed by the
/// assignment expression that becomes the schema root.
#[derive(Debug, Clone)]
pub struct Program {
    pub declares: Vec<Declare>,
    pub assignment: Expr,
}

impl Program {
    pub fn new(assignment: Expr) -> Self {
        Program {
            declares: vec![],
            assignment,
        }
    }

    pub fn declare(mut self, path: &[&str], value: Expr) -> Self {
        self.declares.push(Declare {
            path: path.iter().map(|s| Ident::from(*s)).collect(),
            value,
        });
        self
    }
}

/// `declare a.b.c = <expr>`.
#[derive(Debug, Clone)]
pub struct Declare {
    pub path: Vec<Ident>,
    pub value: Expr,
}

/// Type-level binary operators.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinOp {
    Intersection,
    Union,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    Xor,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BoolOp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LogicOp {
    And,
    Or,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOp {
    Not,
    Neg,
    Pos,
    BitNot,
}

impl core::fmt::Display for BinOp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            BinOp::Intersection => "&",
            BinOp::Union => "|",
        })
    }
}

impl core::fmt::Display for ArithOp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => "%",
            ArithOp::Shl => "<<",
            ArithOp::Shr => ">>",
            ArithOp::Xor => "^",
        })
    }
}

impl core::fmt::Display for BoolOp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            BoolOp::Lt => "<",
            BoolOp::Le => "<=",
            BoolOp::Eq => "==",
            BoolOp::Ge => ">=",
            BoolOp::Gt => ">",
            BoolOp::Ne => "!=",
        })
    }
}

impl core::fmt::Display for LogicOp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            LogicOp::And => "&&",
            LogicOp::Or => "||",
        })
    }
}

impl core::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::BitNot => "~",
        })
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Null,

    Bool(bool),

    Number(Number),

    String(Ident),

    /// Regex literal; only the `i` flag affects matching.
    Regex { pattern: Ident, flags: Ident },

    /// A bare name: either a builtin type or a reference to a declaration.
    Ident(Ident),

    /// The `self` marker: the root datum of the current walk.
    SelfRef,

    UnaryExpr {
        op: UnaryOp,
        arg: Box<Expr>,
    },

    /// `|` and `&` over types.
    BinExpr {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    ArithExpr {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    BoolExpr {
        op: BoolOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    LogicExpr {
        op: LogicOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// `object.a.b` — segments must be static identifiers, strings or
    /// numbers.
    Member {
        object: Box<Expr>,
        path: Vec<Expr>,
    },

    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },

    /// Object literal; lowers to a shape.
    Object(Vec<Property>),

    /// `[T]`, or `[]` for the empty-array-only type.
    ArrayOf(Option<Box<Expr>>),

    /// `(T1, T2, ...)`; a trailing rest marker becomes the rest slot.
    Tuple(Vec<Expr>),

    /// `enum { A, B = 10, C }`.
    Enum(Vec<EnumMember>),

    /// Discriminated match over a computed scrutinee.
    Match {
        scrutinee: Box<Expr>,
        cases: Vec<MatchCase>,
    },

    /// `...T` marker.
    Rest(Box<Expr>),

    /// `T?` marker.
    Optional(Box<Expr>),
}

#[derive(Debug, Clone)]
pub struct Property {
    pub key: PropKey,
    pub optional: bool,
    pub decorators: Vec<Decorator>,
    pub value: Expr,
}

impl Property {
    pub fn new(key: PropKey, value: Expr) -> Self {
        Property {
            key,
            optional: false,
            decorators: vec![],
            value,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn decorate(mut self, name: &str, args: Vec<Expr>) -> Self {
        self.decorators.push(Decorator {
            name: name.into(),
            args,
        });
        self
    }
}

#[derive(Debug, Clone)]
pub enum PropKey {
    Ident(Ident),
    String(Ident),
    Regex { pattern: Ident, flags: Ident },
}

impl PropKey {
    pub fn ident(name: &str) -> Self {
        PropKey::Ident(name.into())
    }

    pub fn regex(pattern: &str) -> Self {
        PropKey::Regex {
            pattern: pattern.into(),
            flags: "".into(),
        }
    }
}

/// `@range(1, 10)`-style decorator attached to an object property.
#[derive(Debug, Clone)]
pub struct Decorator {
    pub name: Ident,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub name: Ident,
    pub value: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct MatchCase {
    pub guard: Expr,
    pub value: Expr,
}

impl Expr {
    pub fn ident(name: &str) -> Expr {
        Expr::Ident(name.into())
    }

    pub fn string(s: &str) -> Expr {
        Expr::String(s.into())
    }

    pub fn number(n: i64) -> Expr {
        Expr::Number(Number::from(n))
    }

    /// `self.a.b...` member access.
    pub fn self_member(path: &[&str]) -> Expr {
        Expr::Member {
            object: Box::new(Expr::SelfRef),
            path: path.iter().map(|s| Expr::string(*s)).collect(),
        }
    }

    pub fn call(name: &str, args: Vec<Expr>) -> Expr {
        Expr::Call {
            callee: Box::new(Expr::ident(name)),
            args,
        }
    }

    pub fn arith(op: ArithOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::ArithExpr {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn union(lhs: Expr, rhs: Expr) -> Expr {
        Expr::BinExpr {
            op: BinOp::Union,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn intersection(lhs: Expr, rhs: Expr) -> Expr {
        Expr::BinExpr {
            op: BinOp::Intersection,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn object(properties: Vec<Property>) -> Expr {
        Expr::Object(properties)
    }
}
